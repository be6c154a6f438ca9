//! Plugin version parsing and ordering
//!
//! Jenkins and its plugins do not follow semver strictly: versions such as
//! `2.222.2`, `1.8`, `2.6.4.1` and `1.0-beta-1` are all common. Release
//! segments are compared numerically with missing segments treated as zero,
//! and the pre-release suffix is ordered with semver rules so that a release
//! sorts after its pre-releases.

use std::cmp::Ordering;
use std::fmt;

use semver::Prerelease;

use crate::version::error::ResolveError;

#[derive(Debug, Clone)]
pub struct PluginVersion {
    release: Vec<u64>,
    pre: Prerelease,
    original: String,
}

impl PluginVersion {
    fn segment(&self, index: usize) -> u64 {
        self.release.get(index).copied().unwrap_or(0)
    }
}

/// Parse a version string, returning `None` when it is not a version.
///
/// Accepts an optional `v` prefix, any number of numeric release segments
/// (leading zeros allowed), a pre-release suffix with or without a leading
/// `-` and ignores `+build` metadata.
///
/// Examples:
/// - "1.8" -> [1, 8]
/// - "2.6.4.1" -> [2, 6, 4, 1]
/// - "1.0-beta-1" -> [1, 0] pre "beta-1"
/// - "1.0beta" -> [1, 0] pre "beta"
pub fn parse_version(version: &str) -> Option<PluginVersion> {
    let trimmed = version.trim();
    let stripped = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let without_build = stripped.split_once('+').map_or(stripped, |(core, _)| core);

    let (core, suffix) = match without_build.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(index) => without_build.split_at(index),
        None => (without_build, ""),
    };
    let pre = match suffix.strip_prefix('-') {
        Some("") => return None,
        Some(dashed) => dashed,
        None => suffix,
    };
    let pre = if pre.is_empty() {
        Prerelease::EMPTY
    } else {
        lenient_prerelease(pre)?
    };

    if core.is_empty() {
        return None;
    }

    let release = core
        .split('.')
        .map(|segment| {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                None
            } else {
                segment.parse::<u64>().ok()
            }
        })
        .collect::<Option<Vec<_>>>()?;

    Some(PluginVersion {
        release,
        pre,
        original: trimmed.to_string(),
    })
}

/// Numeric identifiers with leading zeros (`1.0-01`) are read as numbers
fn lenient_prerelease(suffix: &str) -> Option<Prerelease> {
    let normalized: Vec<&str> = suffix
        .split('.')
        .map(|identifier| {
            if identifier.len() > 1 && identifier.bytes().all(|b| b.is_ascii_digit()) {
                let trimmed = identifier.trim_start_matches('0');
                if trimmed.is_empty() { "0" } else { trimmed }
            } else {
                identifier
            }
        })
        .collect();
    Prerelease::new(&normalized.join(".")).ok()
}

/// Parse a version string that must be valid
pub fn parse_required(version: &str) -> Result<PluginVersion, ResolveError> {
    parse_version(version).ok_or_else(|| ResolveError::MalformedVersion(version.to_string()))
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Ord for PluginVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        (0..len)
            .map(|i| self.segment(i).cmp(&other.segment(i)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.pre.cmp(&other.pre))
    }
}

impl PartialEq for PluginVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for PluginVersion {}

impl PartialOrd for PluginVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
