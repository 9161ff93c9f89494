//! Process-wide store instance
//!
//! The store is constructed once by [`initialize`] (or [`initialize_with`])
//! and lives until the process exits. Every other call fails with
//! [`StoreError::Uninitialized`] until then; the store is never created
//! implicitly.
//!
//! Code that can take the store as a parameter should prefer [`handle`] and
//! pass the returned reference along.

use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::StoreError;
use crate::store::Store;

/// A store that is constructed at most once
pub struct Registry {
    cell: OnceCell<Store<Value>>,
}

static GLOBAL: Registry = Registry::new();

impl Registry {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Construct the store from `config` unless it already exists
    ///
    /// Returns true only for the call that performed the construction.
    /// Concurrent first calls are serialized and all but one are no-ops.
    pub fn initialize_with(&self, config: &Config) -> bool {
        let mut created = false;
        self.cell.get_or_init(|| {
            created = true;
            info!(initial_capacity = config.initial_capacity, "store initialized");
            Store::from_config(config)
        });
        if !created {
            debug!("store already initialized, ignoring");
        }
        created
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn handle(&self) -> Result<&Store<Value>, StoreError> {
        self.cell.get().ok_or_else(|| {
            warn!("store used before initialization");
            StoreError::Uninitialized
        })
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize the process-wide store with the default configuration
///
/// Safe to call any number of times from any thread; only the first call
/// has an effect and data already stored is never reset.
pub fn initialize() {
    GLOBAL.initialize_with(&Config::default());
}

/// Initialize the process-wide store with `config`
///
/// Ignored when the store already exists. Returns whether this call created
/// the store.
pub fn initialize_with(config: &Config) -> bool {
    GLOBAL.initialize_with(config)
}

pub fn is_initialized() -> bool {
    GLOBAL.is_initialized()
}

/// Borrow the process-wide store
pub fn handle() -> Result<&'static Store<Value>, StoreError> {
    GLOBAL.handle()
}

/// Append `value` under `key`
///
/// Earlier values are kept. Despite the name this never overwrites; see
/// [`Store::set`].
pub fn set(key: impl Into<String>, value: Value) -> Result<(), StoreError> {
    handle()?.set(key, value)
}

/// First value ever set under `key`
pub fn get(key: &str) -> Result<Option<Value>, StoreError> {
    handle()?.get(key)
}

/// All values set under `key`, oldest first
pub fn get_all(key: &str) -> Result<Vec<Value>, StoreError> {
    handle()?.get_all(key)
}

/// Value sequences of every key that starts with `prefix`, in no particular order
pub fn prefix_match(prefix: &str) -> Result<Vec<Vec<Value>>, StoreError> {
    handle()?.prefix_match(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_use_before_initialize_fails() {
        let registry = Registry::new();
        assert!(!registry.is_initialized());
        assert_eq!(registry.handle().err(), Some(StoreError::Uninitialized));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let registry = Registry::new();
        assert!(registry.initialize_with(&Config::default()));
        registry.handle().unwrap().set("k", json!(1)).unwrap();

        assert!(!registry.initialize_with(&Config::default()));
        assert_eq!(registry.handle().unwrap().get_all("k").unwrap(), vec![json!(1)]);
    }

    #[test]
    fn test_concurrent_initialize_creates_one_store() {
        let registry = Arc::new(Registry::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.initialize_with(&Config::default()))
            })
            .collect();

        let created = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|created| *created)
            .count();
        assert_eq!(created, 1);
        assert!(registry.is_initialized());
    }

    #[test]
    fn test_global_operations() {
        initialize();
        initialize();
        assert!(is_initialized());
        assert!(!initialize_with(&Config::default()));

        set("global_ops:k", json!("a")).unwrap();
        set("global_ops:k", json!("b")).unwrap();
        set("global_ops:n", Value::Null).unwrap();

        assert_eq!(get("global_ops:k").unwrap(), Some(json!("a")));
        assert_eq!(get_all("global_ops:k").unwrap(), vec![json!("a"), json!("b")]);
        assert_eq!(get("global_ops:n").unwrap(), Some(Value::Null));
        assert_eq!(get("global_ops:missing").unwrap(), None);
        assert!(get_all("global_ops:missing").unwrap().is_empty());

        let mut groups = prefix_match("global_ops:").unwrap();
        groups.sort_by_key(|g| g.len());
        assert_eq!(groups, vec![vec![Value::Null], vec![json!("a"), json!("b")]]);

        // initializing again keeps what was stored
        initialize();
        assert_eq!(get_all("global_ops:k").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_readers_never_observe_partial_writes() {
        const KEYS: usize = 4;
        const WRITES: i64 = 500;

        let registry = Arc::new(Registry::new());
        registry.initialize_with(&Config::default());

        let writer = {
            let registry = Arc::clone(&registry);
            tokio::task::spawn_blocking(move || {
                let store = registry.handle().unwrap();
                let mut rng = rand::rng();
                for i in 0..WRITES {
                    let key = format!("k{}", rng.random_range(0..KEYS));
                    store.set(key, json!(i)).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::task::spawn_blocking(move || {
                    let store = registry.handle().unwrap();
                    for _ in 0..WRITES {
                        for key in 0..KEYS {
                            let values = store.get_all(&format!("k{}", key)).unwrap();
                            // every sequence is strictly increasing and fully formed
                            let nums: Vec<i64> = values.iter().map(|v| v.as_i64().unwrap()).collect();
                            assert!(nums.windows(2).all(|w| w[0] < w[1]));
                        }
                    }
                })
            })
            .collect();

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }

        let store = registry.handle().unwrap();
        let total: usize = store.prefix_match("k").unwrap().iter().map(Vec::len).sum();
        assert_eq!(total, WRITES as usize);
    }
}
