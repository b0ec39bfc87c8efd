//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use halo_bloom::BloomSettings;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of the config file inside the config directory.
pub const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Bloom effect settings.
    pub bloom: BloomSettings,
    /// Synthetic scene the demo renders.
    pub scene: SceneConfig,
    /// Image output settings.
    pub output: OutputConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Synthetic HDR scene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
    /// Seed for light placement.
    pub seed: u64,
    /// Number of bright lights scattered over the frame.
    pub lights: u32,
    /// Peak radiance of a light. Values above the threshold bloom.
    pub light_intensity: f32,
    /// Linear background radiance.
    pub background: f32,
}

/// Output image configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// PNG written after the frame.
    pub path: PathBuf,
    /// Exposure multiplier applied before tonemapping.
    pub exposure: f32,
    /// Dither the combine pass with a white-noise texture.
    pub dither: bool,
    /// Edge length of the square noise texture.
    pub noise_size: u32,
    /// Also write the frame without bloom next to the output.
    pub write_reference: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Directory for JSON logs in debug builds.
    pub log_dir: Option<PathBuf>,
}

// --- Default implementations ---

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            seed: 42,
            lights: 24,
            light_intensity: 6.0,
            background: 0.05,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("bloom.png"),
            exposure: 1.0,
            dither: true,
            noise_size: 64,
            write_reference: false,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

// --- Load / Save ---

impl Config {
    /// Platform config directory, e.g. `~/.config/halo` on Linux.
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("halo"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }
}
