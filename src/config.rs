use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::version::error::ConfigError;

// =============================================================================
// Update center constants
// =============================================================================

/// Base URL serving the latest release of every plugin
pub const DEFAULT_LATEST_URL: &str = "https://updates.jenkins-ci.org/latest";

/// Base URL serving pinned plugin releases
pub const DEFAULT_DOWNLOAD_URL: &str = "https://updates.jenkins-ci.org/download/plugins";

/// File extension of plugin archives
pub const ARCHIVE_EXTENSION: &str = "hpi";

/// Jenkins version checked against when none is given
pub const DEFAULT_JENKINS_VERSION: &str = "2.222.2";

/// Minimum Java version recorded for plugins missing from the update center
pub const BASELINE_JAVA_VERSION: &str = "1.8";

/// What to do with a plugin whose dependencies cannot all be installed
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyPolicy {
    /// Install the plugin anyway and skip the incompatible dependencies
    #[default]
    BestEffort,
    /// Fall back to the declared version when any dependency is incompatible
    AllOrNothing,
}

/// Resolver configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Jenkins release every candidate is checked against
    pub jenkins_version: String,
    /// Java release to check `Minimum-Java-Version` against, unchecked when unset
    pub java_version: Option<String>,
    /// Upper bound on plugins resolved at the same time
    pub concurrency: usize,
    pub dependency_policy: DependencyPolicy,
    pub update_center: UpdateCenterConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            jenkins_version: DEFAULT_JENKINS_VERSION.to_string(),
            java_version: None,
            concurrency: default_concurrency(),
            dependency_policy: DependencyPolicy::default(),
            update_center: UpdateCenterConfig::default(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from a JSON file, using defaults for missing fields
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()
    }

    /// Reject settings the resolver cannot run with
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Update center endpoints
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateCenterConfig {
    pub latest_url: String,
    pub download_url: String,
}

impl Default for UpdateCenterConfig {
    fn default() -> Self {
        Self {
            latest_url: DEFAULT_LATEST_URL.to_string(),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
        }
    }
}

/// Two workers per CPU; fetches spend most of their time waiting on the network.
pub fn default_concurrency() -> usize {
    num_cpus::get() * 2
}

/// Returns the path to the data directory for hpi-update.
/// Uses $XDG_DATA_HOME/hpi-update if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/hpi-update,
/// or ./hpi-update if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the default path of the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("hpi-update.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("hpi-update")
}
