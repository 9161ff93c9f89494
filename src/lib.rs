//! Concurrency-safe in-memory registry holding, per key, every value ever set
//!
//! Values are appended, never overwritten: [`Store::get`] returns the first
//! value stored under a key and [`Store::get_all`] returns all of them in
//! insertion order. Lookups by key prefix scan every key.
//!
//! [`Store`] can be owned directly. The [`global`] module wraps one
//! process-wide instance that must be initialized before use.

pub mod config;
pub mod error;
pub mod global;
pub mod logging;
pub mod store;

pub use config::{Config, LogConfig};
pub use error::{ConfigError, StoreError};
pub use serde_json::Value;
pub use store::Store;
