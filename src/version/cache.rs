//! In-memory memoization of fetched plugin records
//!
//! Update center releases are immutable, so a record fetched once for a
//! `(name, version)` pair stays valid for the whole run. Entries are never
//! evicted or replaced.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::version::error::CacheError;
use crate::version::types::PluginRecord;

/// Cache key: plugin name and requested version, empty for "latest"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub name: String,
    pub version: String,
}

impl CacheKey {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

#[derive(Default)]
pub struct MetadataCache {
    records: Mutex<HashMap<CacheKey, PluginRecord>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the map lock with proper error handling
    fn lock_records(&self) -> Result<MutexGuard<'_, HashMap<CacheKey, PluginRecord>>, CacheError> {
        self.records.lock().map_err(|_| CacheError::LockPoisoned)
    }

    pub fn get(&self, name: &str, version: &str) -> Result<Option<PluginRecord>, CacheError> {
        let records = self.lock_records()?;
        Ok(records.get(&CacheKey::new(name, version)).cloned())
    }

    /// Store a record unless the key is already present.
    ///
    /// Returns the record held by the cache afterwards, which is the earlier
    /// one when two fetches for the same key raced.
    pub fn set(
        &self,
        name: &str,
        version: &str,
        record: PluginRecord,
    ) -> Result<PluginRecord, CacheError> {
        let mut records = self.lock_records()?;
        let stored = records
            .entry(CacheKey::new(name, version))
            .or_insert_with(|| {
                debug!("Caching {}@{}", name, display_version(version));
                record
            });
        Ok(stored.clone())
    }

    pub fn has(&self, name: &str, version: &str) -> Result<bool, CacheError> {
        let records = self.lock_records()?;
        Ok(records.contains_key(&CacheKey::new(name, version)))
    }

    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.lock_records()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.lock_records()?.is_empty())
    }
}

/// Human readable form of a requested version for log lines
pub(crate) fn display_version(version: &str) -> &str {
    if version.is_empty() { "latest" } else { version }
}
