//! Configuration file handling
//!
//! One JSON file (`routervault.json` by default) with serde defaults for
//! everything except the paths a deployment genuinely has to choose.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::orchestrator::DEFAULT_ALERT_THRESHOLD;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {path} could not be read: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config file {path} could not be written: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config file {path} is not valid: {source}")]
    Invalid {
        path: PathBuf,
        source: serde_json::Error,
    },
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("./backups")
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_schedule() -> String {
    // Nightly at 03:00 local time
    "0 3 * * *".to_string()
}

fn default_alert_threshold() -> u32 {
    DEFAULT_ALERT_THRESHOLD
}

/// Process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the registry, history and schedule documents.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Root directory artifacts are downloaded into.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Messaging destination for notices, artifacts and alerts.
    #[serde(default)]
    pub chat_id: i64,

    /// Bot token; when absent the CLI logs instead of delivering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_token: Option<String>,

    /// Bound on SSH connect, seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Cron expression used when no custom override is stored.
    #[serde(default = "default_schedule")]
    pub default_schedule: String,

    /// Consecutive failures per device before the escalation alert fires.
    #[serde(default = "default_alert_threshold")]
    pub failure_alert_threshold: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backup_dir: default_backup_dir(),
            chat_id: 0,
            telegram_token: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            default_schedule: default_schedule(),
            failure_alert_threshold: default_alert_threshold(),
        }
    }
}

impl Config {
    /// Loads the configuration from `path`.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let bytes = fs::read(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Writes the default configuration to `path` for `init`.
    pub fn write_default(path: &Path) -> ConfigResult<Self> {
        let config = Config::default();
        let data = serde_json::to_vec_pretty(&config).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, data).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(config)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
