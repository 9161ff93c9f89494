use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{error, trace};

use crate::config::Config;
use crate::error::StoreError;

/// In-memory multi-value store
///
/// Every key holds the ordered sequence of all values ever set under it.
/// `set` appends rather than replaces, and `get` returns the oldest value.
/// All access goes through one reader/writer lock over the whole mapping.
pub struct Store<V> {
    entries: RwLock<HashMap<String, Vec<V>>>,
}

impl<V: Clone> Store<V> {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create an empty store with room for `capacity` keys
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_capacity(config.initial_capacity)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Vec<V>>>, StoreError> {
        self.entries.read().map_err(|_| {
            error!("store lock poisoned on read");
            StoreError::Poisoned
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Vec<V>>>, StoreError> {
        self.entries.write().map_err(|_| {
            error!("store lock poisoned on write");
            StoreError::Poisoned
        })
    }

    /// Append `value` to the sequence stored under `key`
    ///
    /// Earlier values under the same key are kept; nothing is overwritten
    /// or deduplicated.
    pub fn set(&self, key: impl Into<String>, value: V) -> Result<(), StoreError> {
        let key = key.into();
        let mut entries = self.write()?;
        trace!(key = %key, "append value");
        entries.entry(key).or_default().push(value);
        Ok(())
    }

    /// Get the first value ever set under `key`
    pub fn get(&self, key: &str) -> Result<Option<V>, StoreError> {
        let entries = self.read()?;
        Ok(entries.get(key).and_then(|values| values.first()).cloned())
    }

    /// Get a copy of every value set under `key`, oldest first
    ///
    /// An absent key yields an empty vector.
    pub fn get_all(&self, key: &str) -> Result<Vec<V>, StoreError> {
        let entries = self.read()?;
        Ok(entries.get(key).cloned().unwrap_or_default())
    }

    /// Collect the value sequences of every key starting with `prefix`
    ///
    /// Scans all keys. The order between matching keys is unspecified and
    /// an empty prefix matches everything.
    pub fn prefix_match(&self, prefix: &str) -> Result<Vec<Vec<V>>, StoreError> {
        let entries = self.read()?;
        let matches: Vec<Vec<V>> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(_, values)| values.clone())
            .collect();
        trace!(prefix = %prefix, scanned = entries.len(), matched = matches.len(), "prefix scan");
        Ok(matches)
    }

    /// Number of distinct keys
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.read()?.is_empty())
    }

    pub fn contains_key(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.read()?.contains_key(key))
    }
}

impl<V: Clone> Default for Store<V> {
    fn default() -> Self {
        Self::new()
    }
}
