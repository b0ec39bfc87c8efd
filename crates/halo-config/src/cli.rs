//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Halo bloom demo command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "halo", about = "Render a synthetic HDR frame with bloom")]
pub struct CliArgs {
    /// Viewport width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Viewport height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Brightness where bloom starts.
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Soft knee in [0, 1].
    #[arg(long)]
    pub soft_knee: Option<f32>,

    /// Bloom strength.
    #[arg(long)]
    pub intensity: Option<f32>,

    /// Maximum mip-chain depth.
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Scene seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output PNG path.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Disable combine dithering.
    #[arg(long)]
    pub no_dither: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.scene.width = w;
        }
        if let Some(h) = args.height {
            self.scene.height = h;
        }
        if let Some(t) = args.threshold {
            self.bloom.threshold = t;
        }
        if let Some(k) = args.soft_knee {
            self.bloom.soft_knee = k.clamp(0.0, 1.0);
        }
        if let Some(i) = args.intensity {
            self.bloom.intensity = i;
        }
        if let Some(n) = args.iterations {
            self.bloom.iterations = n;
        }
        if let Some(seed) = args.seed {
            self.scene.seed = seed;
        }
        if let Some(ref path) = args.output {
            self.output.path = path.clone();
        }
        if args.no_dither {
            self.output.dither = false;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
