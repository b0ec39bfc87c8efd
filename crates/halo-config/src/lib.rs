//! Configuration for the halo bloom tools.
//!
//! Settings persist to disk as RON and can be overridden from the command
//! line via clap. Unknown fields are ignored and missing ones fall back to
//! defaults.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CONFIG_FILE, Config, DebugConfig, OutputConfig, SceneConfig};
pub use error::ConfigError;
