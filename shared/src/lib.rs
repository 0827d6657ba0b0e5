//! Shared configuration and common types for the trusted authentication server
//!
//! This crate provides functionality used across all server modules:
//! - Configuration types
//! - Error response structures

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, AuthConfig, CacheConfig, CacheStrategyConfig, CacheType, ConfigError,
    Environment, LoggingConfig, ServerConfig, ServerTrustConfig, SessionConfig, TokenStorage,
    TrustedLoginConfig, TrustedTokenConfig,
};
pub use errors::{error_codes, ErrorResponse};
