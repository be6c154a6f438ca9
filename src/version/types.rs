//! Request and metadata types shared by the fetcher, policy and resolver

/// One plugin of the declared list, immutable for the whole run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRequest {
    pub name: String,
    /// Version currently declared, empty when the list gave none
    pub declared_version: String,
    /// Keep `declared_version` instead of looking for the latest release
    pub locked: bool,
}

impl PluginRequest {
    pub fn new(name: impl Into<String>, declared_version: impl Into<String>, locked: bool) -> Self {
        Self {
            name: name.into(),
            declared_version: declared_version.into(),
            locked,
        }
    }

    /// Version to ask the update center for: pinned when locked, latest otherwise
    pub fn wanted_version(&self) -> &str {
        if self.locked { &self.declared_version } else { "" }
    }
}

/// A dependency declared by a plugin: `name:minVersion`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRef {
    pub name: String,
    pub min_version: String,
}

impl DependencyRef {
    pub fn new(name: impl Into<String>, min_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_version: min_version.into(),
        }
    }
}

/// Metadata describing one installable plugin release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRecord {
    pub name: String,
    pub long_name: String,
    /// Empty when the update center did not know the plugin and no version was requested
    pub version: String,
    pub dependencies: Vec<DependencyRef>,
    /// Oldest Jenkins release able to run this plugin (`Jenkins-Version`)
    pub min_platform_version: String,
    /// Oldest Java release able to run this plugin (`Minimum-Java-Version`)
    pub min_runtime_version: String,
}

impl PluginRecord {
    /// Record for a plugin missing from the update center.
    ///
    /// Custom plugins are trusted: no dependencies and a platform requirement
    /// equal to the target, so they always pass the compatibility check.
    pub fn placeholder(
        name: &str,
        version: &str,
        platform_version: &str,
        runtime_version: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            long_name: name.to_string(),
            version: version.to_string(),
            dependencies: Vec::new(),
            min_platform_version: platform_version.to_string(),
            min_runtime_version: runtime_version.to_string(),
        }
    }

    /// Fill in an empty version with the one the plugin was declared at
    pub fn with_version_or(mut self, declared_version: &str) -> Self {
        if self.version.is_empty() {
            self.version = declared_version.to_string();
        }
        self
    }
}
