//! Server configuration

use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

use super::error::ValidationError;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on. Also identifies this instance on relayed messages.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed cross-origin sources (comma-separated)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,

    /// Rust log filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How long shutdown reconciliation may run before the process exits anyway
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl ServerConfig {
    /// Host and port to bind, in the form `TcpListener::bind` resolves.
    ///
    /// The host may be an IPv4 or IPv6 literal (bracketed or bare) or a
    /// hostname such as `localhost`.
    pub fn bind_addr(&self) -> (&str, u16) {
        let host = self
            .host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(&self.host);
        (host, self.port)
    }

    /// Get CORS origins as a vector
    pub fn cors_origins_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Get the shutdown grace period as Duration
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Validate server configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.shutdown_grace_ms == 0 {
            return Err(ValidationError::InvalidGracePeriod);
        }
        let (host, _) = self.bind_addr();
        if host.parse::<IpAddr>().is_err() && !is_hostname(host) {
            return Err(ValidationError::InvalidHost(self.host.clone()));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            log_level: default_log_level(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

fn is_hostname(host: &str) -> bool {
    !host.is_empty()
        && host.len() <= 253
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_cors_origins() -> String {
    "http://localhost:3000".to_string()
}

fn default_log_level() -> String {
    "info,chat_relay=debug,tower_http=info".to_string()
}

fn default_shutdown_grace_ms() -> u64 {
    5000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3001);
        assert_eq!(config.shutdown_grace(), Duration::from_secs(5));
    }

    #[test]
    fn test_bind_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3002,
            ..Default::default()
        };
        assert_eq!(config.bind_addr(), ("127.0.0.1", 3002));
    }

    #[test]
    fn test_bind_addr_strips_ipv6_brackets() {
        let config = ServerConfig {
            host: "[::1]".to_string(),
            ..Default::default()
        };
        assert_eq!(config.bind_addr(), ("::1", 3001));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hostnames_and_bare_ipv6_are_valid_hosts() {
        for host in ["localhost", "relay-1.internal", "::", "0.0.0.0"] {
            let config = ServerConfig {
                host: host.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_ok(), "{} should be accepted", host);
        }
    }

    #[tokio::test]
    async fn test_hostname_binds() {
        let config = ServerConfig {
            host: "localhost".to_string(),
            port: 0,
            ..Default::default()
        };
        let listener = tokio::net::TcpListener::bind(config.bind_addr()).await;
        assert!(listener.is_ok(), "bind failed: {:?}", listener.err());
    }

    #[test]
    fn test_cors_origins_parsing() {
        let config = ServerConfig {
            cors_origins: "http://localhost:5173, http://localhost:3000,".to_string(),
            ..Default::default()
        };
        let origins = config.cors_origins_list();
        assert_eq!(origins, vec!["http://localhost:5173", "http://localhost:3000"]);
    }

    #[test]
    fn test_validation_invalid_port() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidPort)));
    }

    #[test]
    fn test_validation_zero_grace_period() {
        let config = ServerConfig {
            shutdown_grace_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidGracePeriod)
        ));
    }

    #[test]
    fn test_validation_invalid_host() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidHost(_))
        ));
    }
}
