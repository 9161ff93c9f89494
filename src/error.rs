//! Error types for the store and its configuration

use thiserror::Error;

/// Errors returned by store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The process-wide store was used before `initialize` was called
    #[error("store used before initialization")]
    Uninitialized,
    /// A writer panicked while holding the lock
    #[error("store lock poisoned")]
    Poisoned,
}

/// Errors raised while loading configuration or installing logging
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to install logging: {0}")]
    Logging(String),
}
