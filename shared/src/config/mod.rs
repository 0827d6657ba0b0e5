//! Configuration module with sub-modules per concern
//!
//! - `auth` - Trusted tokens, server trust, sessions and the trusted login endpoint
//! - `cache` - Cluster-replicated cache (Redis) configuration
//! - `environment` - Environment detection and logging configuration
//! - `server` - HTTP server configuration
//!
//! The whole tree is built once at startup and handed to constructors; nothing
//! here is mutated after the services are running.

pub mod auth;
pub mod cache;
pub mod environment;
pub mod server;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export commonly used types
pub use auth::{
    AuthConfig, ServerTrustConfig, SessionConfig, TokenStorage, TrustedLoginConfig,
    TrustedTokenConfig,
};
pub use cache::{CacheConfig, CacheStrategyConfig, CacheType};
pub use environment::{Environment, LoggingConfig};
pub use server::ServerConfig;

/// Invalid configuration value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    #[serde(default)]
    pub environment: Environment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Cache configuration
    #[serde(default)]
    pub cache: CacheStrategyConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment
    pub fn from_env() -> Self {
        let environment = Environment::from_env();
        let mut logging = LoggingConfig::for_environment(environment);
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            logging.level = level;
        }
        if let Ok(level) = std::env::var("TOKEN_LOG_LEVEL") {
            logging.token_level = Some(level);
        }

        Self {
            environment,
            server: ServerConfig::from_env(),
            auth: AuthConfig::from_env(),
            cache: CacheStrategyConfig::from_env(),
            logging,
        }
    }

    /// Validate every section that has constraints
    ///
    /// Production additionally refuses the well-known server-trust secret.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.validate()?;
        if self.environment.is_production()
            && self.auth.server_trust.enabled
            && self.auth.server_trust.is_using_default_secret()
        {
            return Err(ConfigError::Invalid {
                field: "server_trust.shared_secret".to_string(),
                reason: "the default secret is not allowed in production".to_string(),
            });
        }
        Ok(())
    }
}
