//! Tracing subscriber setup.
//!
//! The terminal UI owns the screen, so interactive sessions log to a file.
//! One-shot commands log to stderr.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Default log file location, under the platform's local data directory.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("carreira-ti").join("carreira.log"))
}

/// `RUST_LOG` wins; otherwise `default_level` (e.g. `"info"` or `"carreira_core=debug"`).
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Installs the global subscriber. Keep the returned guard alive for the
/// whole process when logging to a file, or buffered lines are lost.
pub fn init(target: &LogTarget, default_level: &str) -> anyhow::Result<Option<WorkerGuard>> {
    match target {
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(env_filter(default_level))
                .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
                .try_init()
                .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;
            Ok(None)
        }
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);

            tracing_subscriber::registry()
                .with(env_filter(default_level))
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true),
                )
                .try_init()
                .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;
            Ok(Some(guard))
        }
    }
}

/// Like [`init`], but a target that cannot be set up falls back to
/// `fallback`, and failing that the process runs without logging.
pub fn init_or_fallback(
    target: &LogTarget,
    fallback: Option<&LogTarget>,
    default_level: &str,
) -> Option<WorkerGuard> {
    let first_error = match init(target, default_level) {
        Ok(guard) => return guard,
        Err(e) => e,
    };

    match fallback.map(|fallback| init(fallback, default_level)) {
        Some(Ok(guard)) => {
            tracing::warn!("logging to {:?} failed, using fallback: {}", target, first_error);
            guard
        }
        _ => None,
    }
}

/// Opens `path` for appending, creating its directory first.
fn open_log_file(path: &Path) -> anyhow::Result<File> {
    let (dir, _) = split_log_path(path)?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))
}

fn split_log_path(path: &Path) -> anyhow::Result<(PathBuf, String)> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("log path has no file name: {}", path.display()))?
        .to_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file_name))
}
