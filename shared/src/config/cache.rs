//! Cache configuration module
//!
//! The cluster-replicated cache carries each server's signing keys so that a
//! token minted on one node can be validated on any other. Session markers
//! live in the same cache when session storage is enabled.

use serde::{Deserialize, Serialize};

/// Connection settings for the shared Redis instance
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    pub url: String,

    /// Seconds to wait for a connection before retrying
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Namespace prepended to every key, so several clusters can share one
    /// Redis without reading each other's signing keys
    #[serde(default)]
    pub key_prefix: Option<String>,

    /// Redis logical database (0-15)
    #[serde(default)]
    pub database: u8,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            connection_timeout: default_connection_timeout(),
            key_prefix: None,
            database: 0,
        }
    }
}

impl CacheConfig {
    /// Read `REDIS_URL`, `REDIS_KEY_PREFIX`, `REDIS_DATABASE` and
    /// `REDIS_CONNECT_TIMEOUT`
    pub fn from_env() -> Self {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| default_redis_url());
        let key_prefix = std::env::var("REDIS_KEY_PREFIX").ok().filter(|p| !p.is_empty());
        let database = std::env::var("REDIS_DATABASE")
            .ok()
            .and_then(|v| v.parse::<u8>().ok())
            .unwrap_or(0);
        let connection_timeout = std::env::var("REDIS_CONNECT_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_connection_timeout);

        Self {
            url,
            connection_timeout,
            key_prefix,
            ..Default::default()
        }
        .with_database(database)
    }

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Select a logical database, clamped to 15
    pub fn with_database(mut self, db: u8) -> Self {
        self.database = db.min(15);
        self
    }

    /// Apply the namespace to a key
    pub fn make_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

/// Which backend replicates keys and sessions between servers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    /// Shared Redis instance, required for multi-node deployments
    Redis,
    /// Process-local maps; only valid for a single node
    Memory,
}

impl std::str::FromStr for CacheType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redis" => Ok(CacheType::Redis),
            "memory" | "local" => Ok(CacheType::Memory),
            _ => Err(format!("Invalid cache type: {}", s)),
        }
    }
}

/// Cache strategy configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheStrategyConfig {
    /// Cache type (redis, memory)
    #[serde(default = "default_cache_type")]
    pub cache_type: CacheType,

    /// Redis configuration, used when `cache_type` is redis
    #[serde(default)]
    pub redis: CacheConfig,
}

impl Default for CacheStrategyConfig {
    fn default() -> Self {
        Self {
            cache_type: default_cache_type(),
            redis: CacheConfig::default(),
        }
    }
}

impl CacheStrategyConfig {
    /// Create from environment variables (`CLUSTER_CACHE`, `REDIS_*`)
    pub fn from_env() -> Self {
        let cache_type = std::env::var("CLUSTER_CACHE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_cache_type);

        Self {
            cache_type,
            redis: CacheConfig::from_env(),
        }
    }
}

fn default_redis_url() -> String {
    String::from("redis://localhost:6379")
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_cache_type() -> CacheType {
    CacheType::Memory
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.url, "redis://localhost:6379");
        assert_eq!(config.database, 0);
        assert_eq!(config.connection_timeout, 5);
    }

    #[test]
    fn test_cache_config_with_prefix() {
        let config = CacheConfig::new("redis://cache:6379")
            .with_prefix("trusted")
            .with_database(2);

        assert_eq!(config.make_key("key:node1:3"), "trusted:key:node1:3");
        assert_eq!(config.database, 2);
    }

    #[test]
    fn test_cache_key_without_prefix() {
        let config = CacheConfig::default();
        assert_eq!(config.make_key("key:node1:3"), "key:node1:3");
    }

    #[test]
    fn test_database_is_clamped() {
        let config = CacheConfig::default().with_database(42);
        assert_eq!(config.database, 15);
    }

    #[test]
    fn test_cache_type_from_str() {
        assert_eq!("redis".parse::<CacheType>().unwrap(), CacheType::Redis);
        assert_eq!("Memory".parse::<CacheType>().unwrap(), CacheType::Memory);
        assert!("memcached".parse::<CacheType>().is_err());
    }

    #[test]
    fn test_cache_strategy_default_is_single_node() {
        let config = CacheStrategyConfig::default();
        assert_eq!(config.cache_type, CacheType::Memory);
    }
}
