//! HTTP listener settings for one node

use serde::{Deserialize, Serialize};

/// Where and how this node accepts requests
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    /// Worker count, 0 leaves the choice to actix (one per core)
    #[serde(default)]
    pub workers: usize,

    /// Keep-alive in seconds
    #[serde(default = "default_keep_alive")]
    pub keep_alive: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 8080,
            workers: 0,
            keep_alive: default_keep_alive(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Read `SERVER_HOST`, `SERVER_PORT`, `SERVER_WORKERS` and
    /// `SERVER_KEEP_ALIVE`; unparsable values fall back to the defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("SERVER_HOST").unwrap_or(defaults.host),
            port: parse_env("SERVER_PORT").unwrap_or(defaults.port),
            workers: parse_env("SERVER_WORKERS").unwrap_or(defaults.workers),
            keep_alive: parse_env("SERVER_KEEP_ALIVE").unwrap_or(defaults.keep_alive),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn default_keep_alive() -> u64 {
    75
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.workers, 0);
        assert_eq!(config.keep_alive, 75);
    }

    #[test]
    fn test_bind_address() {
        let config = ServerConfig::new("0.0.0.0", 9000);
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }
}
