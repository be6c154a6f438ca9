//! Plugin source test utilities

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use hpi_update::config::ResolverConfig;
use hpi_update::version::error::FetchError;
use hpi_update::version::manifest::{
    JENKINS_VERSION, LONG_NAME, Manifest, PLUGIN_DEPENDENCIES, PLUGIN_VERSION, SHORT_NAME,
};
use hpi_update::version::registry::PluginSource;

/// In-memory update center
#[derive(Default)]
pub struct MockUpdateCenter {
    releases: HashMap<(String, String), Manifest>,
    calls: AtomicUsize,
}

impl MockUpdateCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a pinned release of `name`
    pub fn with_release(mut self, name: &str, version: &str, jenkins: &str, deps: &str) -> Self {
        self.releases.insert(
            (name.to_string(), version.to_string()),
            manifest(name, version, jenkins, deps),
        );
        self
    }

    /// Publish a release of `name` that is also served as its latest
    pub fn with_latest(mut self, name: &str, version: &str, jenkins: &str, deps: &str) -> Self {
        self.releases.insert(
            (name.to_string(), String::new()),
            manifest(name, version, jenkins, deps),
        );
        self.with_release(name, version, jenkins, deps)
    }

    #[allow(dead_code)]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn manifest(name: &str, version: &str, jenkins: &str, deps: &str) -> Manifest {
    let long_name = format!("{name} plugin");
    [
        (SHORT_NAME, name),
        (LONG_NAME, long_name.as_str()),
        (PLUGIN_VERSION, version),
        (JENKINS_VERSION, jenkins),
        (PLUGIN_DEPENDENCIES, deps),
    ]
    .into_iter()
    .collect()
}

#[async_trait]
impl PluginSource for MockUpdateCenter {
    async fn fetch_manifest(&self, name: &str, version: &str) -> Result<Manifest, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.releases
            .get(&(name.to_string(), version.to_string()))
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("{name}@{version}")))
    }
}

/// Resolver config targeting `jenkins`
pub fn test_config(jenkins: &str) -> ResolverConfig {
    ResolverConfig {
        jenkins_version: jenkins.to_string(),
        concurrency: 4,
        ..ResolverConfig::default()
    }
}

/// Update center answering every request with the same server error
#[allow(dead_code)]
pub struct FailingUpdateCenter {
    pub status: u16,
}

#[async_trait]
impl PluginSource for FailingUpdateCenter {
    async fn fetch_manifest(&self, name: &str, _version: &str) -> Result<Manifest, FetchError> {
        Err(FetchError::UnexpectedStatus {
            status: self.status,
            url: format!("/latest/{name}.hpi"),
        })
    }
}
