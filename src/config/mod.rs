use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::ConfigError;

/// Log configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LogConfig {
  /// Log file path, if not set, logs will be printed to stdout
  pub file: Option<String>,
  /// Log level, default is "info"
  #[serde(default = "default_log_level")]
  pub level: String,
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      file: None,
      level: default_log_level(),
    }
  }
}

/// Store configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
  /// Number of keys to reserve room for up front
  #[serde(default)]
  pub initial_capacity: usize,

  /// Log configuration
  #[serde(default)]
  pub log: LogConfig,
}

impl Config {
  /// Load configuration from TOML file
  pub fn from_file(path: &str) -> Result<Self, ConfigError> {
    let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_string(),
      source,
    })?;

    toml::from_str(&config_str).map_err(|source| ConfigError::Parse {
      path: path.to_string(),
      source,
    })
  }

  /// Parse configuration from a TOML string
  pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
    toml::from_str(s).map_err(|source| ConfigError::Parse {
      path: "<inline>".to_string(),
      source,
    })
  }
}
