//! Tracing setup: append to a log file under the XDG state dir, or stderr.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,easy_retry=debug";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

/// `~/.local/state/easy-retry/easy-retry.log` (or `$XDG_STATE_HOME/...`).
pub fn default_log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("easy-retry")?;
    Ok(xdg_dirs
        .get_state_home()
        .join("easy-retry")
        .join("easy-retry.log"))
}

/// Open `path` for appending, creating parent directories as needed.
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

/// `RUST_LOG` if set, otherwise `info` globally and `debug` for this crate.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber for `target`. Fails if the log file cannot be
/// opened or a subscriber is already installed.
pub fn init(target: &LogTarget) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false);

    match target {
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            builder
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            tracing::info!("easy-retry logging to {}", path.display());
        }
        LogTarget::Stderr => {
            builder
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!("{e}"))?;
        }
    }
    Ok(())
}

/// Log to the default file. On failure (e.g. state dir unwritable) the caller
/// can fall back to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    init(&LogTarget::File(default_log_path()?))
}

pub fn init_logging_stderr() {
    let _ = init(&LogTarget::Stderr);
}
