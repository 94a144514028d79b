//! Exporter configuration, loaded from TOML.

use ovn_client::ClientConfig;
use ovn_logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::components::Toggle;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Address the scrape endpoint listens on.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    /// Timeout applied to each backend call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum time between two collections, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default)]
    pub disable: DisableConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

/// Components the exporter must not query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisableConfig {
    #[serde(default)]
    pub ovsdb_server: bool,
    #[serde(default)]
    pub ovs_vswitchd: bool,
    #[serde(default)]
    pub northd: bool,
    #[serde(default)]
    pub northbound: bool,
    #[serde(default)]
    pub southbound: bool,
}

impl DisableConfig {
    pub fn is_disabled(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::OvsdbServer => self.ovsdb_server,
            Toggle::OvsVswitchd => self.ovs_vswitchd,
            Toggle::Northd => self.northd,
            Toggle::Northbound => self.northbound,
            Toggle::Southbound => self.southbound,
        }
    }
}

fn default_listen_address() -> String {
    "0.0.0.0:9476".to_string()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_timeout_secs() -> u64 {
    2
}

fn default_poll_interval_secs() -> u64 {
    15
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            metrics_path: default_metrics_path(),
            timeout_secs: default_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            disable: DisableConfig::default(),
            log: LogConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

impl ExporterConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("poll_interval_secs must be positive".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        if !self.metrics_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "metrics_path must start with '/': {:?}",
                self.metrics_path
            )));
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_address.parse().map_err(|_| {
            ConfigError::Invalid(format!("bad listen_address: {:?}", self.listen_address))
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExporterConfig::default();
        assert_eq!(config.listen_address, "0.0.0.0:9476");
        assert_eq!(config.metrics_path, "/metrics");
        assert_eq!(config.timeout(), Duration::from_secs(2));
        assert_eq!(config.poll_interval_secs, 15);
        assert_eq!(config.disable, DisableConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = ExporterConfig::from_toml_str(
            r#"
            poll_interval_secs = 30

            [disable]
            northd = true

            [client.northbound]
            name = "OVN_Northbound"
            socket_remote = "tcp:10.0.0.1:6641"
            data_path = "/data/nb.db"
            log_path = "/logs/nb.log"
            pid_path = "/run/nb.pid"
            "#,
        )
        .unwrap();
        assert_eq!(config.poll_interval_secs, 30);
        assert_eq!(config.timeout_secs, 2);
        assert!(config.disable.is_disabled(Toggle::Northd));
        assert!(!config.disable.is_disabled(Toggle::Southbound));
        assert_eq!(config.client.northbound.socket_remote, "tcp:10.0.0.1:6641");
        assert_eq!(config.client.northbound.port_raft, 0);
        assert_eq!(config.client.southbound.port_raft, 6644);
    }

    #[test]
    fn test_validation() {
        let bad = [
            "poll_interval_secs = 0",
            "timeout_secs = 0",
            "metrics_path = \"metrics\"",
            "listen_address = \"localhost\"",
        ];
        for text in bad {
            let err = ExporterConfig::from_toml_str(text).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{}", text);
        }
        let err = ExporterConfig::from_toml_str("poll_interval_secs = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_default_config_dumps_and_reloads() {
        let text = ExporterConfig::default().to_toml_string().unwrap();
        let back = ExporterConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, ExporterConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let err = ExporterConfig::load(Path::new("/nonexistent/ovn-exporter.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
