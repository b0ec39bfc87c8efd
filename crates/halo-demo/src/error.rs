use std::path::PathBuf;

use halo_bloom::BloomError;
use halo_config::ConfigError;

/// Errors that end a demo run.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("bloom failed: {0}")]
    Bloom(#[from] BloomError),

    #[error("camera color missing after the frame")]
    MissingFrame,

    #[error("failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
