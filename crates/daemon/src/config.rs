//! The config snapshot consumed by the daemon.
//!
//! How a snapshot is produced — file parsing, `include`/`include_dir`
//! directives, `$(ENV_VAR)` substitution from a config file's own syntax —
//! is out of scope here and assumed to happen upstream (a CLI, a config
//! management tool). This module only defines the snapshot's stable shape
//! and a minimal JSON loader so the daemon binary is runnable standalone.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use warden_adapters::SocketSpec;
use warden_core::WatcherConfig;

/// Global options carried alongside the three ordered collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalOptions {
    #[serde(default = "default_check_delay_secs")]
    pub check_delay_secs: f64,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub pubsub_endpoint: Option<String>,
    #[serde(default)]
    pub stats_endpoint: Option<String>,
    #[serde(default)]
    pub statsd: bool,
    #[serde(default)]
    pub umask: Option<u32>,
    #[serde(default)]
    pub warmup_delay_secs: f64,
    #[serde(default = "default_loglevel")]
    pub loglevel: String,
    #[serde(default)]
    pub pidfile: Option<PathBuf>,
}

fn default_check_delay_secs() -> f64 {
    1.0
}

fn default_loglevel() -> String {
    "info".to_string()
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self {
            check_delay_secs: default_check_delay_secs(),
            endpoint: None,
            pubsub_endpoint: None,
            stats_endpoint: None,
            statsd: false,
            umask: None,
            warmup_delay_secs: 0.0,
            loglevel: default_loglevel(),
            pidfile: None,
        }
    }
}

/// Stable schema for a config snapshot: global options plus three ordered
/// lists. Plugin descriptors ride along for forward compatibility but are
/// not interpreted here (plugin business logic is out of scope).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub global: GlobalOptions,
    #[serde(default)]
    pub watchers: Vec<WatcherConfig>,
    #[serde(default)]
    pub sockets: Vec<SocketSpec>,
    #[serde(default)]
    pub plugins: Vec<serde_json::Value>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config snapshot at {path}: {source}")]
    Read { path: PathBuf, #[source] source: std::io::Error },
    #[error("invalid config snapshot: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Load a snapshot from a JSON file. Exit code `2` (configuration snapshot
/// invalid) is the caller's responsibility to translate a `ConfigError` into.
pub fn load_snapshot(path: &Path) -> Result<ConfigSnapshot, ConfigError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
