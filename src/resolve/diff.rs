//! Report of what a resolution run changed
//!
//! One line per resolved plugin, sorted by name:
//!
//! ```text
//! credentials: + 2.3.0
//! git: 4.2.2 -> 4.3.0
//! mailer: o 1.30
//! ssh-agent: 1.19
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::plugins::{PluginEntry, PluginsFile};
use crate::version::types::{PluginRecord, PluginRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Brought in as a dependency
    Added { version: String },
    Updated { from: String, to: String },
    Locked { version: String },
    Unchanged { version: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub name: String,
    pub change: Change,
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.change {
            Change::Added { version } => write!(f, "{}: + {}", self.name, version),
            Change::Updated { from, to } => write!(f, "{}: {} -> {}", self.name, from, to),
            Change::Locked { version } => write!(f, "{}: o {}", self.name, version),
            Change::Unchanged { version } => write!(f, "{}: {}", self.name, version),
        }
    }
}

/// Compare the resolved plugins with the requests they came from
pub fn diff(requests: &[PluginRequest], resolved: &BTreeMap<String, PluginRecord>) -> Vec<DiffLine> {
    let requests = by_name(requests);

    resolved
        .iter()
        .map(|(name, record)| {
            let change = match requests.get(name.as_str()) {
                None => Change::Added {
                    version: record.version.clone(),
                },
                Some(request) if request.declared_version != record.version => Change::Updated {
                    from: request.declared_version.clone(),
                    to: record.version.clone(),
                },
                Some(request) if request.locked => Change::Locked {
                    version: request.declared_version.clone(),
                },
                Some(request) => Change::Unchanged {
                    version: request.declared_version.clone(),
                },
            };
            DiffLine {
                name: name.clone(),
                change,
            }
        })
        .collect()
}

/// Declarative list describing the resolved plugins, locks carried over
pub fn updated_list(
    requests: &[PluginRequest],
    resolved: &BTreeMap<String, PluginRecord>,
) -> PluginsFile {
    let requests = by_name(requests);

    PluginsFile {
        jenkins_plugins: resolved
            .iter()
            .map(|(name, record)| PluginEntry {
                name: name.clone(),
                title: Some(record.long_name.clone()),
                version: Some(record.version.clone()),
                version_lock: requests.get(name.as_str()).is_some_and(|r| r.locked),
            })
            .collect(),
    }
}

fn by_name(requests: &[PluginRequest]) -> HashMap<&str, &PluginRequest> {
    requests
        .iter()
        .map(|request| (request.name.as_str(), request))
        .collect()
}
