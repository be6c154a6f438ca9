//! Shared map of plugins chosen for installation
//!
//! `get` and `insert` are each atomic, but nothing spans a read and a later
//! write: two workers may check the same name and both commit, the last
//! write wins. Output ordering stays deterministic because the map is sorted.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::version::error::CacheError;
use crate::version::types::PluginRecord;

#[derive(Default)]
pub struct ResolvedSet {
    plugins: Mutex<BTreeMap<String, PluginRecord>>,
}

impl ResolvedSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_plugins(&self) -> Result<MutexGuard<'_, BTreeMap<String, PluginRecord>>, CacheError> {
        self.plugins.lock().map_err(|_| CacheError::LockPoisoned)
    }

    pub fn get(&self, name: &str) -> Result<Option<PluginRecord>, CacheError> {
        Ok(self.lock_plugins()?.get(name).cloned())
    }

    /// Store `record` under `name`, returning the record it replaced
    pub fn insert(
        &self,
        name: &str,
        record: PluginRecord,
    ) -> Result<Option<PluginRecord>, CacheError> {
        Ok(self.lock_plugins()?.insert(name.to_string(), record))
    }

    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.lock_plugins()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.lock_plugins()?.is_empty())
    }

    /// Sorted copy of the current contents
    pub fn snapshot(&self) -> Result<BTreeMap<String, PluginRecord>, CacheError> {
        Ok(self.lock_plugins()?.clone())
    }
}

impl FromIterator<(String, PluginRecord)> for ResolvedSet {
    fn from_iter<T: IntoIterator<Item = (String, PluginRecord)>>(iter: T) -> Self {
        Self {
            plugins: Mutex::new(iter.into_iter().collect()),
        }
    }
}
