use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::error::{AppError, Result};

/// `RUST_LOG` wins over the configured directive.
fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Log to a file while the terminal UI owns the screen.
///
/// The returned guard flushes the background writer on drop; keep it alive
/// for the life of the program.
pub fn init_file(level: &str, path: &Path) -> Result<WorkerGuard> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|e| AppError::Config(format!("logging: {}", e)))?;
    Ok(guard)
}

/// Log to stderr, used by headless `--print` runs.
pub fn init_stderr(level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Config(format!("logging: {}", e)))
}
