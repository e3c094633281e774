//! Application configuration
//!
//! Read once at startup from `<config dir>/phonepad/config.toml`. Missing
//! fields fall back to their defaults, so a partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

const CONFIG_DIR: &str = "phonepad";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config directory on this platform")]
    NoConfigDir,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown log level {0:?}")]
    UnknownLogLevel(String),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Host placed in the join URL; detected when unset
    pub public_host: Option<String>,
    pub log_level: String,
    /// Seconds without any inbound frame before a client is dropped, 0 disables
    pub liveness_timeout_secs: u64,
    pub ping_interval_secs: u64,
    /// Capacity of each client's outbound message queue
    pub outbound_queue: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            public_host: None,
            log_level: "info".to_string(),
            liveness_timeout_secs: 30,
            ping_interval_secs: 10,
            outbound_queue: 100,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        Ok(path)
    }

    /// Writes the default config to `path` unless a file already exists.
    /// Returns whether a file was written.
    pub async fn ensure_default_config(path: &Path) -> Result<bool, ConfigError> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        if exists {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let content = toml::to_string_pretty(&AppConfig::default())?;
        tokio::fs::write(path, content)
            .await
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(true)
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn log_level(&self) -> Result<Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::UnknownLogLevel(self.log_level.clone()))
    }

    pub fn liveness_timeout(&self) -> Option<Duration> {
        (self.liveness_timeout_secs > 0).then(|| Duration::from_secs(self.liveness_timeout_secs))
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str("port = 9001\npublic_host = \"pad.local\"\n").unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.public_host.as_deref(), Some("pad.local"));
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.outbound_queue, 100);
    }

    #[test]
    fn durations() {
        let mut config = AppConfig::default();
        assert_eq!(config.liveness_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.ping_interval(), Duration::from_secs(10));

        config.liveness_timeout_secs = 0;
        config.ping_interval_secs = 0;
        assert_eq!(config.liveness_timeout(), None);
        assert_eq!(config.ping_interval(), Duration::from_secs(1));
    }

    #[test]
    fn log_level_parsing() {
        let mut config = AppConfig::default();
        config.log_level = "debug".to_string();
        assert_eq!(config.log_level().unwrap(), Level::DEBUG);
        config.log_level = "chatty".to_string();
        assert!(matches!(
            config.log_level(),
            Err(ConfigError::UnknownLogLevel(name)) if name == "chatty"
        ));
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(matches!(
            AppConfig::from_toml_str("port = \"eight thousand\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn default_file_round_trip() {
        let mut path = std::env::temp_dir();
        path.push(format!("phonepad-config-{}", std::process::id()));
        path.push(CONFIG_FILE);

        assert!(AppConfig::ensure_default_config(&path).await.unwrap());
        assert!(!AppConfig::ensure_default_config(&path).await.unwrap());
        let loaded = AppConfig::load(&path).await.unwrap();
        assert_eq!(loaded, AppConfig::default());

        if let Some(parent) = path.parent() {
            let _ = tokio::fs::remove_dir_all(parent).await;
        }
    }
}
