//! Compatibility policy deciding whether a plugin release may be installed

use std::collections::HashMap;

use crate::resolve::resolved::ResolvedSet;
use crate::version::error::ResolveError;
use crate::version::semver::{PluginVersion, parse_required};
use crate::version::types::PluginRecord;

/// Outcome of checking a candidate release
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Candidate can be installed
    Accept,
    /// A newer release of the same plugin is already resolved
    Downgrade { resolved_version: String },
    /// The plugin is locked by a request to another version
    Locked { locked_version: String },
    /// Target Jenkins is older than the candidate requires
    PlatformTooOld { required: String },
    /// Configured Java runtime is older than the candidate requires
    RuntimeTooOld { required: String },
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// Greedy acceptance policy: never downgrade, never break a lock, never
/// exceed the target platform.
#[derive(Debug, Clone)]
pub struct CompatibilityPolicy {
    platform_version: PluginVersion,
    runtime_version: Option<PluginVersion>,
    locked: HashMap<String, String>,
}

impl CompatibilityPolicy {
    pub fn new(platform_version: &str) -> Result<Self, ResolveError> {
        Ok(Self {
            platform_version: parse_required(platform_version)?,
            runtime_version: None,
            locked: HashMap::new(),
        })
    }

    /// Also check `Minimum-Java-Version` against `runtime_version`
    pub fn with_runtime_version(mut self, runtime_version: &str) -> Result<Self, ResolveError> {
        self.runtime_version = Some(parse_required(runtime_version)?);
        Ok(self)
    }

    /// Plugins pinned by locked requests, name to version
    pub fn with_locked(mut self, locked: HashMap<String, String>) -> Self {
        self.locked = locked;
        self
    }

    pub fn platform_version(&self) -> &PluginVersion {
        &self.platform_version
    }

    /// Check `candidate` against the plugins resolved so far.
    ///
    /// Never mutates `resolved`. Fails on versions that cannot be parsed.
    pub fn evaluate(
        &self,
        candidate: &PluginRecord,
        resolved: &ResolvedSet,
    ) -> Result<Verdict, ResolveError> {
        if let Some(existing) = resolved.get(&candidate.name)? {
            let existing_version = parse_required(&existing.version)?;
            let candidate_version = parse_required(&candidate.version)?;
            if existing_version > candidate_version {
                return Ok(Verdict::Downgrade {
                    resolved_version: existing.version,
                });
            }
        }

        if let Some(locked_version) = self.locked.get(&candidate.name)
            && *locked_version != candidate.version
        {
            return Ok(Verdict::Locked {
                locked_version: locked_version.clone(),
            });
        }

        let required_platform = parse_required(&candidate.min_platform_version)?;
        if self.platform_version < required_platform {
            return Ok(Verdict::PlatformTooOld {
                required: candidate.min_platform_version.clone(),
            });
        }

        if let Some(runtime) = &self.runtime_version
            && !candidate.min_runtime_version.is_empty()
            && *runtime < parse_required(&candidate.min_runtime_version)?
        {
            return Ok(Verdict::RuntimeTooOld {
                required: candidate.min_runtime_version.clone(),
            });
        }

        Ok(Verdict::Accept)
    }

    pub fn accepts(
        &self,
        candidate: &PluginRecord,
        resolved: &ResolvedSet,
    ) -> Result<bool, ResolveError> {
        Ok(self.evaluate(candidate, resolved)?.is_accept())
    }
}
