//! Declarative plugin list stored as YAML
//!
//! ```yaml
//! jenkins_plugins:
//!   - name: git
//!     title: Jenkins Git plugin
//!     version: "4.2.2"
//!     version_lock: true
//! ```

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use tempfile::NamedTempFile;

use crate::version::error::PluginsFileError;
use crate::version::types::PluginRequest;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PluginsFile {
    #[serde(default)]
    pub jenkins_plugins: Vec<PluginEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PluginEntry {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_version")]
    pub version: Option<String>,
    #[serde(default, alias = "lock")]
    pub version_lock: bool,
}

impl PluginEntry {
    pub fn to_request(&self) -> PluginRequest {
        PluginRequest::new(
            self.name.as_str(),
            self.version.as_deref().unwrap_or_default(),
            self.version_lock,
        )
    }
}

impl PluginsFile {
    pub fn requests(&self) -> Vec<PluginRequest> {
        self.jenkins_plugins.iter().map(PluginEntry::to_request).collect()
    }
}

/// Unquoted versions such as `1.10` arrive as YAML numbers and lose their
/// trailing zeros here.
fn deserialize_version<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawVersion {
        Text(String),
        Integer(u64),
        Float(f64),
    }

    Ok(Option::<RawVersion>::deserialize(deserializer)?.map(|raw| match raw {
        RawVersion::Text(text) => text,
        RawVersion::Integer(number) => number.to_string(),
        RawVersion::Float(number) => number.to_string(),
    }))
}

pub fn parse(content: &str) -> Result<PluginsFile, PluginsFileError> {
    // An empty document has no mapping at all
    if content.trim().is_empty() {
        return Ok(PluginsFile::default());
    }
    Ok(serde_yaml::from_str(content)?)
}

pub fn read(path: &Path) -> Result<PluginsFile, PluginsFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| PluginsFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}

/// Emit the list in the same shape it is read in.
///
/// Unset titles and versions are left out, as is `version_lock: false`.
/// Titles containing a colon are always quoted.
pub fn render(file: &PluginsFile) -> Result<String, PluginsFileError> {
    if file.jenkins_plugins.is_empty() {
        return Ok("jenkins_plugins: []\n".to_string());
    }

    let mut out = String::from("jenkins_plugins:\n");
    for entry in &file.jenkins_plugins {
        out.push_str(&format!("- name: {}\n", scalar(&entry.name)?));
        if let Some(title) = &entry.title {
            out.push_str(&format!("  title: {}\n", title_scalar(title)?));
        }
        if let Some(version) = &entry.version {
            out.push_str(&format!("  version: {}\n", scalar(version)?));
        }
        if entry.version_lock {
            out.push_str("  version_lock: true\n");
        }
    }
    Ok(out)
}

/// A string as the YAML emitter writes it, indented to sit under a list item
fn scalar(value: &str) -> Result<String, PluginsFileError> {
    let emitted = serde_yaml::to_string(value)?;
    Ok(emitted.trim_end_matches('\n').replace('\n', "\n    "))
}

fn title_scalar(title: &str) -> Result<String, PluginsFileError> {
    let emitted = scalar(title)?;
    let plain = !emitted.starts_with(['\'', '"', '|', '>']);
    if plain && title.contains(':') {
        Ok(format!("'{}'", title.replace('\'', "''")))
    } else {
        Ok(emitted)
    }
}

/// Replace `path` with `file` through a temporary sibling, so a failure never
/// leaves a half-written list behind.
pub fn write(path: &Path, file: &PluginsFile) -> Result<(), PluginsFileError> {
    let content = render(file)?;
    let io_error = |source| PluginsFileError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir).map_err(io_error)?;
    temp.write_all(content.as_bytes()).map_err(io_error)?;
    temp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}
