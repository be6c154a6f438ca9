//! Tracing setup for the binary
//!
//! Human readable logs go to stderr so stdout only carries the diff. A JSON
//! copy can be written to a file as well.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config;

const DEFAULT_FILTER: &str = "hpi_update=info";

/// Where the JSON log goes, if anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFile {
    Disabled,
    /// `config::log_path()`
    Default,
    Path(PathBuf),
}

impl LogFile {
    /// `--log-file` absent, given bare, or given a path
    pub fn from_flag(flag: Option<Option<PathBuf>>) -> Self {
        match flag {
            None => LogFile::Disabled,
            Some(None) => LogFile::Default,
            Some(Some(path)) => LogFile::Path(path),
        }
    }

    fn path(&self) -> Option<PathBuf> {
        match self {
            LogFile::Disabled => None,
            LogFile::Default => Some(config::log_path()),
            LogFile::Path(path) => Some(path.clone()),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer when dropped and must be kept
/// alive until the program exits.
pub fn init(log_file: &LogFile) -> anyhow::Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter());

    let Some(path) = log_file.path() else {
        tracing_subscriber::registry().with(stderr_layer).try_init()?;
        return Ok(None);
    };

    let (dir, file_name) = split_log_path(&path)?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(&dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer()
        .json()
        .with_writer(writer)
        .with_filter(env_filter());

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;
    Ok(Some(guard))
}

fn split_log_path(path: &Path) -> anyhow::Result<(PathBuf, &std::ffi::OsStr)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Log file path {} has no file name", path.display()))?;
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((dir, file_name))
}
