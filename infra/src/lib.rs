//! # Infrastructure Layer
//!
//! Concrete implementations of the collaborator traits declared in `ta_core`
//! that need an external service:
//!
//! - **Cache**: Redis client with retry, the cluster key store replicating
//!   every node's signing keys, and session marker storage

// Re-export core types for convenience
pub use ta_core::errors::{DomainError, DomainResult};

/// Cache module - Redis client and Redis-backed stores
pub mod cache;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Stored value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        match err {
            InfrastructureError::Config(message) => DomainError::Configuration { message },
            other => DomainError::Internal {
                message: other.to_string(),
            },
        }
    }
}
