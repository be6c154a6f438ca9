use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Shared state lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Archive has no META-INF/MANIFEST.MF")]
    MissingManifest,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Plugin not found: {0}")]
    NotFound(String),

    #[error("Unexpected status {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Malformed version string '{0}'")]
    MalformedVersion(String),

    #[error("Malformed manifest of {plugin}: {reason}")]
    MalformedManifest { plugin: String, reason: String },

    #[error("No version could be resolved for {0}")]
    MissingVersion(String),

    #[error("Dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    #[error("Resolver task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Worker pool closed")]
    PoolClosed(#[from] tokio::sync::AcquireError),
}

#[derive(Debug, Error)]
pub enum PluginsFileError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid plugins file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    PluginsFile(#[from] PluginsFileError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}
