//! Tracing subscriber setup.
//!
//! Filter precedence: `SALES_LOG`, then `RUST_LOG`, then the verbosity default
//! (`warn`, or `info` with `-v`). The TUI owns the terminal, so it only logs
//! when a log file is configured.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

fn env_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "info" } else { "warn" };
    EnvFilter::try_from_env("SALES_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Log to stderr (CLI commands).
pub fn init_stderr(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Log to an append-only file (TUI).
pub fn init_file(path: &Path, verbose: bool) -> Result<(), AppError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open log file '{}': {e}", path.display())))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}
