//! Source trait for fetching plugin manifests

#[cfg(test)]
use mockall::automock;

use crate::version::error::FetchError;
use crate::version::manifest::Manifest;

/// Trait for fetching plugin manifests from an update center
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait PluginSource: Send + Sync {
    /// Fetches the manifest of one plugin release
    ///
    /// # Arguments
    /// * `name` - Short name of the plugin (e.g., "git")
    /// * `version` - Release to fetch, or empty for the latest release
    ///
    /// # Returns
    /// * `Ok(Manifest)` - Main section of the release's manifest
    /// * `Err(FetchError::NotFound)` - The update center does not know this release
    /// * `Err(_)` - Any other failure, which aborts resolution
    async fn fetch_manifest(&self, name: &str, version: &str) -> Result<Manifest, FetchError>;
}
