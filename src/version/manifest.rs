//! Plugin archive manifest reading
//!
//! A `.hpi` archive is a zip file whose `META-INF/MANIFEST.MF` carries the
//! plugin metadata as `Key: value` lines. Values longer than 72 bytes wrap
//! onto continuation lines that start with a single space.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::version::error::ManifestError;
use crate::version::types::DependencyRef;

const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

pub const SHORT_NAME: &str = "Short-Name";
pub const LONG_NAME: &str = "Long-Name";
pub const PLUGIN_VERSION: &str = "Plugin-Version";
pub const PLUGIN_DEPENDENCIES: &str = "Plugin-Dependencies";
pub const JENKINS_VERSION: &str = "Jenkins-Version";
pub const MINIMUM_JAVA_VERSION: &str = "Minimum-Java-Version";

const OPTIONAL_RESOLUTION: &str = "resolution:=optional";

/// `name:version` followed by `;attribute` parameters
static DEPENDENCY_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[^:;\s]+):(?P<version>[^:;\s]+)(?P<attrs>(?:;[^;]*)*)$")
        .expect("dependency pattern is valid")
});

/// Main section attributes of a manifest, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    attributes: IndexMap<String, String>,
}

impl Manifest {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Like [`Manifest::get`] but treats blank values as absent
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.trim().is_empty())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Manifest {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut manifest = Manifest::default();
        for (key, value) in iter {
            manifest.insert(key, value);
        }
        manifest
    }
}

/// Read the manifest of the plugin archive at `path`
pub fn read_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    read_manifest_from(File::open(path)?)
}

/// Read the manifest out of any seekable zip stream
pub fn read_manifest_from<R: Read + Seek>(reader: R) -> Result<Manifest, ManifestError> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut entry = match archive.by_name(MANIFEST_PATH) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Err(ManifestError::MissingManifest),
        Err(e) => return Err(e.into()),
    };

    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(parse_manifest(&content))
}

/// Parse the main section of a manifest.
///
/// Stops at the first blank line; per-entry sections that follow are not
/// plugin metadata. The first occurrence of a key wins.
pub fn parse_manifest(content: &str) -> Manifest {
    let mut manifest = Manifest::default();
    let mut current: Option<(String, String)> = None;

    for line in content.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(continuation) = line.strip_prefix(' ') {
            if let Some((_, value)) = current.as_mut() {
                value.push_str(continuation);
            }
            continue;
        }

        if let Some((key, value)) = current.take() {
            manifest.attributes.entry(key).or_insert(value);
        }

        if line.is_empty() {
            break;
        }

        if let Some((key, value)) = line.split_once(':') {
            let value = value.strip_prefix(' ').unwrap_or(value);
            current = Some((key.trim().to_string(), value.to_string()));
        }
    }

    if let Some((key, value)) = current {
        manifest.attributes.entry(key).or_insert(value);
    }

    manifest
}

/// Parse a `Plugin-Dependencies` value.
///
/// Entries look like `workflow-cps:2.80;resolution:=optional`. Optional
/// entries are dropped. Returns the offending entry when one is malformed.
pub fn parse_dependencies(value: &str) -> Result<Vec<DependencyRef>, String> {
    let mut dependencies = Vec::new();

    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let captures = DEPENDENCY_ENTRY
            .captures(entry)
            .ok_or_else(|| entry.to_string())?;

        let optional = captures["attrs"]
            .split(';')
            .any(|attr| attr.trim() == OPTIONAL_RESOLUTION);
        if optional {
            continue;
        }

        dependencies.push(DependencyRef::new(&captures["name"], &captures["version"]));
    }

    Ok(dependencies)
}
