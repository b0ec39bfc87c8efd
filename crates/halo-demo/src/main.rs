//! Headless bloom demo.
//!
//! Renders a seeded HDR scene of small bright lights, runs one frame of
//! bloom on the CPU backend, and writes the tonemapped result as PNG.
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags:
//! `cargo run -p halo-demo -- --iterations 4 -o glow.png`.

mod error;
mod output;
mod scene;

use std::process::ExitCode;

use clap::Parser;
use glam::UVec2;
use halo_bloom::{
    CameraView, FrameContext, FrameOutcome, FramePassOrchestrator, PixelFormat, RenderTarget,
};
use halo_config::{CliArgs, Config};
use halo_soft::{Image, SoftDevice, SoftPipeline, SoftPrograms};
use tracing::{error, info, warn};

use crate::error::DemoError;

/// Format of the camera color and scene.
const SCENE_FORMAT: PixelFormat = PixelFormat::Rgba16Float;

/// Keeps the dither pattern independent of light placement.
const NOISE_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

const NOISE_TARGET: RenderTarget = RenderTarget::Imported(0);

/// Scene before and after bloom.
struct Rendered {
    scene: Image,
    frame: Image,
    outcome: FrameOutcome,
}

fn render(config: &Config) -> Result<Rendered, DemoError> {
    let scene = scene::render(&config.scene, SCENE_FORMAT);
    info!(
        "Scene {}x{} with {} lights, peak radiance {:.2}",
        config.scene.width,
        config.scene.height,
        config.scene.lights,
        scene::peak(&scene)
    );

    let mut device = SoftDevice::new();
    device.import(RenderTarget::CameraColor, scene.clone());

    let mut settings = config.bloom.clone();
    settings.noise = config.output.dither.then(|| {
        let size = config.output.noise_size.max(1);
        device.import_noise(NOISE_TARGET, size, size, config.scene.seed ^ NOISE_SEED_SALT)
    });

    let mut orchestrator = FramePassOrchestrator::<SoftPipeline>::new();
    orchestrator.setup(&settings, Some(SoftPrograms::standard()))?;

    let camera = CameraView::game(
        UVec2::new(config.scene.width, config.scene.height),
        SCENE_FORMAT,
    );
    let outcome = orchestrator.render_frame(&mut device, &camera)?;
    if let Some(engine) = orchestrator.engine() {
        info!(
            "Bloom {:?}: {} mip levels, {} submissions",
            outcome,
            engine.mip_chain().len(),
            device.submissions()
        );
    }

    let mut recorder = device.acquire_recorder();
    orchestrator.dispose(&mut recorder);
    let disposed = device.submit(&mut recorder);
    device.release_recorder(recorder);
    if let Err(err) = disposed {
        warn!("Releasing bloom targets failed: {err}");
    }

    let frame = device
        .take(RenderTarget::CameraColor)
        .ok_or(DemoError::MissingFrame)?;
    Ok(Rendered {
        scene,
        frame,
        outcome,
    })
}

fn run(config: &Config) -> Result<(), DemoError> {
    let rendered = render(config)?;
    if rendered.outcome != FrameOutcome::Applied {
        warn!("Bloom was not applied ({:?})", rendered.outcome);
    }

    output::write_png(&rendered.frame, config.output.exposure, &config.output.path)?;
    if config.output.write_reference {
        let path = output::reference_path(&config.output.path);
        output::write_png(&rendered.scene, config.output.exposure, &path)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = match args.config.clone().map(Ok).unwrap_or_else(Config::default_dir) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config
        .debug
        .log_dir
        .clone()
        .unwrap_or_else(|| config_dir.join("logs"));
    halo_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
