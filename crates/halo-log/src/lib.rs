//! Structured logging for the halo tools.
//!
//! Console output with uptime timestamps and module paths, plus a JSON log
//! file in debug builds. Library crates log through the `log` facade, which
//! the subscriber picks up once initialized.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use halo_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File name of the JSON log inside the log directory.
pub const LOG_FILE_NAME: &str = "halo.log";

const DEFAULT_FILTER: &str = "info,wgpu=warn,naga=warn";

/// Filter directive for `config`, falling back to the default.
pub fn filter_directive(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => {
            config.debug.log_level.clone()
        }
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. When `debug_build`
/// is set and `log_dir` is given, a JSON copy of every event goes to
/// [`LOG_FILE_NAME`] in that directory; a log file that cannot be opened is
/// reported once the console is up.
///
/// ```no_run
/// use halo_config::Config;
/// use halo_log::init_logging;
///
/// let config = Config::default();
/// init_logging(None, false, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let log_file = log_dir
        .filter(|_| debug_build)
        .map(|dir| open_log_file(dir).map_err(|err| (dir.join(LOG_FILE_NAME), err)));
    let (log_file, file_error) = match log_file {
        Some(Ok(file)) => (Some(file), None),
        Some(Err(failure)) => (None, Some(failure)),
        None => (None, None),
    };

    let json_layer = log_file.map(|file| {
        fmt::layer()
            .json()
            .with_writer(file)
            .with_ansi(false)
            .with_timer(fmt::time::uptime())
    });

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(
            fmt::layer()
                .with_thread_names(true)
                .with_timer(fmt::time::uptime()),
        )
        .with(json_layer)
        .init();

    if let Some((path, err)) = file_error {
        tracing::warn!("Could not open log file {}: {err}", path.display());
    }
}

/// `RUST_LOG` if set and valid, otherwise the directive from `config`.
fn env_filter(config: Option<&Config>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(config)))
}

/// Create `log_dir` if needed and truncate [`LOG_FILE_NAME`] inside it.
pub fn open_log_file(log_dir: &Path) -> io::Result<File> {
    fs::create_dir_all(log_dir)?;
    File::create(log_dir.join(LOG_FILE_NAME))
}

/// `EnvFilter` with the default directive: `info`, with `wgpu` and `naga`
/// held at `warn`.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}
