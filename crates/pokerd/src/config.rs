//! Server configuration.
//!
//! The only knobs are the listen address and port. Each resolves from a
//! command-line flag, then an environment variable, then a default.

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3001;

/// Default listening address (all interfaces).
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Environment variable holding the listening port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable holding the listening address.
pub const HOST_ENV: &str = "POKERD_HOST";

/// Resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self { bind_addr }
    }

    /// Resolves the configuration from flags and the process environment.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidPort` if `PORT` is set but not a valid port
    /// - `ConfigError::InvalidHost` if the host is not an IP address
    pub fn resolve(host: Option<String>, port: Option<u16>) -> Result<Self, ConfigError> {
        Self::resolve_with(host, port, |key| std::env::var(key).ok())
    }

    /// Resolves the configuration using `env` to look up variables.
    pub fn resolve_with<F>(
        host: Option<String>,
        port: Option<u16>,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match port {
            Some(port) => port,
            None => match env(PORT_ENV) {
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidPort { value })?,
                None => DEFAULT_PORT,
            },
        };

        let host = host
            .or_else(|| env(HOST_ENV))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let ip: IpAddr = host
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidHost { value: host.clone() })?;

        Ok(Self::new(SocketAddr::new(ip, port)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::new(
            IpAddr::from([0, 0, 0, 0]),
            DEFAULT_PORT,
        ))
    }
}

/// Errors resolving the server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid port {value:?} in PORT")]
    InvalidPort { value: String },

    #[error("Invalid listen address {value:?} (expected an IP address)")]
    InvalidHost { value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::resolve_with(None, None, env_of(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr.port(), 3001);
    }

    #[test]
    fn test_port_from_env() {
        let config = ServerConfig::resolve_with(None, None, env_of(&[("PORT", "8080")])).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn test_flag_overrides_env() {
        let config = ServerConfig::resolve_with(
            Some("127.0.0.1".to_string()),
            Some(9000),
            env_of(&[("PORT", "8080"), ("POKERD_HOST", "10.0.0.1")]),
        )
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_host_from_env() {
        let config =
            ServerConfig::resolve_with(None, None, env_of(&[("POKERD_HOST", "::1")])).unwrap();
        assert_eq!(config.bind_addr, "[::1]:3001".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::resolve_with(None, None, env_of(&[("PORT", "http")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidPort {
                value: "http".to_string()
            }
        );
        assert_eq!(err.to_string(), "Invalid port \"http\" in PORT");

        assert!(ServerConfig::resolve_with(None, None, env_of(&[("PORT", "70000")])).is_err());
    }

    #[test]
    fn test_invalid_host() {
        let err = ServerConfig::resolve_with(Some("example.com".to_string()), None, env_of(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHost { .. }));
    }
}
