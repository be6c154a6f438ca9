//! Memoized plugin metadata fetching
//!
//! Wraps a [`PluginSource`] with the per-run [`MetadataCache`] and turns raw
//! manifests into [`PluginRecord`]s. Plugins the update center does not know
//! (custom or in-house builds) get a placeholder record instead of an error.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::BASELINE_JAVA_VERSION;
use crate::version::cache::{MetadataCache, display_version};
use crate::version::error::{FetchError, ResolveError};
use crate::version::manifest::{
    JENKINS_VERSION, LONG_NAME, MINIMUM_JAVA_VERSION, Manifest, PLUGIN_DEPENDENCIES,
    PLUGIN_VERSION, SHORT_NAME, parse_dependencies,
};
use crate::version::registry::PluginSource;
use crate::version::types::PluginRecord;

pub struct MetadataFetcher {
    source: Arc<dyn PluginSource>,
    cache: MetadataCache,
    platform_version: String,
}

impl MetadataFetcher {
    /// `platform_version` is the target Jenkins release, used as the platform
    /// requirement of placeholders and of manifests lacking `Jenkins-Version`.
    pub fn new(source: Arc<dyn PluginSource>, platform_version: &str) -> Self {
        Self {
            source,
            cache: MetadataCache::new(),
            platform_version: platform_version.to_string(),
        }
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Fetch the record of `name` at `version`, or the latest release when
    /// `version` is empty.
    pub async fn fetch(&self, name: &str, version: &str) -> Result<PluginRecord, ResolveError> {
        if let Some(record) = self.cache.get(name, version)? {
            debug!("Cache hit for {}@{}", name, display_version(version));
            return Ok(record);
        }

        let record = match self.source.fetch_manifest(name, version).await {
            Ok(manifest) => self.record_from_manifest(name, &manifest)?,
            Err(FetchError::NotFound(url)) => {
                info!(
                    "{}@{} not found at {}, treating it as a custom plugin",
                    name,
                    display_version(version),
                    url
                );
                PluginRecord::placeholder(
                    name,
                    version,
                    &self.platform_version,
                    BASELINE_JAVA_VERSION,
                )
            }
            Err(e) => return Err(e.into()),
        };

        Ok(self.cache.set(name, version, record)?)
    }

    fn record_from_manifest(
        &self,
        name: &str,
        manifest: &Manifest,
    ) -> Result<PluginRecord, ResolveError> {
        let short_name = manifest.get_non_empty(SHORT_NAME).unwrap_or(name);

        let dependencies = match manifest.get_non_empty(PLUGIN_DEPENDENCIES) {
            Some(value) => {
                parse_dependencies(value).map_err(|entry| ResolveError::MalformedManifest {
                    plugin: short_name.to_string(),
                    reason: format!("invalid dependency entry '{entry}'"),
                })?
            }
            None => Vec::new(),
        };

        Ok(PluginRecord {
            name: short_name.to_string(),
            long_name: manifest
                .get_non_empty(LONG_NAME)
                .unwrap_or(short_name)
                .to_string(),
            version: manifest
                .get_non_empty(PLUGIN_VERSION)
                .unwrap_or_default()
                .to_string(),
            dependencies,
            min_platform_version: manifest
                .get_non_empty(JENKINS_VERSION)
                .unwrap_or(self.platform_version.as_str())
                .to_string(),
            min_runtime_version: manifest
                .get_non_empty(MINIMUM_JAVA_VERSION)
                .unwrap_or_default()
                .to_string(),
        })
    }
}
