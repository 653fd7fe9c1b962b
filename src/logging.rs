use crate::config::LogConfig;
use std::env;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable that overrides the configured filter
pub const LOG_ENV: &str = "PANEL_CLEAN_LOG";

/// Level implied by `-q`/`-v` flags on top of the configured one.
/// Negative is quieter, positive is more verbose.
pub fn effective_level(configured: &str, verbosity: i8) -> String {
    match verbosity {
        i8::MIN..=-1 => "error".to_string(),
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber. Keep the returned guard alive until exit
/// so the file writer flushes.
pub fn init_logger(config: &LogConfig, verbosity: i8) -> Option<WorkerGuard> {
    let filter = env::var(LOG_ENV).unwrap_or_else(|_| effective_level(&config.level, verbosity));
    let filter_layer = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let (file_layer, guard) = match config.file.as_deref() {
        Some(path) => {
            let (dir, name) = split_log_path(path);
            let file_appender = tracing_appender::rolling::never(dir, name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(filter_layer)
        .try_init();

    if installed.is_err() {
        // Already set, e.g. by a test harness
        return guard;
    }

    tracing::debug!(filter = %filter, "logging initialised");
    guard
}

fn split_log_path(path: &Path) -> (&Path, &std::ffi::OsStr) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("panel-clean.log"));
    (dir, name)
}
