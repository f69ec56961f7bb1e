//! # Configuration
//!
//! Runtime configuration of the bridge, loaded from an optional TOML file.
//! Every field has a default, so an empty file (or no file at all) yields a proxy
//! listening on `127.0.0.1:3000` in front of `http://localhost:4001`.
//!
//! ```toml
//! listen_addr = "0.0.0.0:3000"
//! service = "habits.HabitService"
//! log_level = "debug"
//!
//! [upstream]
//! url = "http://habits-backend:4001"
//! connect_timeout_ms = 2000
//! request_timeout_ms = 10000
//! ```
use serde::Deserialize;
use std::{net::SocketAddr, path::Path, time::Duration};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    Io(String, #[source] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyConfig {
    /// Address the HTTP/1.1 listener binds to.
    pub listen_addr: SocketAddr,
    /// Fully qualified name of the proxied service; it defines the path namespace.
    pub service: String,
    /// Default `tracing` filter when `RUST_LOG` is not set.
    pub log_level: String,
    pub upstream: UpstreamConfig,
}

/// How to reach the real gRPC backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamConfig {
    pub url: String,
    pub connect_timeout_ms: Option<u64>,
    /// Deadline applied by the transport to every upstream call.
    pub request_timeout_ms: Option<u64>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            service: habits_service::SERVICE_NAME.to_string(),
            log_level: "info".to_string(),
            upstream: UpstreamConfig::default(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:4001".to_string(),
            connect_timeout_ms: None,
            request_timeout_ms: None,
        }
    }
}

impl ProxyConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e))?;
        content.parse()
    }
}

impl std::str::FromStr for ProxyConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: ProxyConfig = "".parse().unwrap();
        assert_eq!(config, ProxyConfig::default());
        assert_eq!(config.service, "habits.HabitService");
        assert_eq!(config.upstream.url, "http://localhost:4001");
    }

    #[test]
    fn test_partial_config() {
        let config: ProxyConfig = r#"
            listen_addr = "0.0.0.0:8080"

            [upstream]
            url = "http://backend:4001"
            request_timeout_ms = 1500
        "#
        .parse()
        .unwrap();

        assert_eq!(config.listen_addr, SocketAddr::from(([0, 0, 0, 0], 8080)));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.upstream.url, "http://backend:4001");
        assert_eq!(config.upstream.connect_timeout(), None);
        assert_eq!(
            config.upstream.request_timeout(),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result: Result<ProxyConfig, _> = "listen_port = 3000".parse();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = ProxyConfig::load("/definitely/not/here/pont.toml");
        assert!(matches!(result, Err(ConfigError::Io(_, _))));
    }
}
