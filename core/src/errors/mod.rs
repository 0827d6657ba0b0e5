//! Domain-specific error types and error handling.

mod types;

pub use types::TokenError;

use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Local key-ring file could not be read or written
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<ta_shared::ConfigError> for DomainError {
    fn from(err: ta_shared::ConfigError) -> Self {
        DomainError::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Persistence {
            message: err.to_string(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_error_bridges_into_domain_error() {
        let err: DomainError = TokenError::TokenExpired.into();
        assert!(matches!(err, DomainError::Token(TokenError::TokenExpired)));
        assert_eq!(err.to_string(), "Token expired");
    }

    #[test]
    fn test_io_error_is_persistence() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: DomainError = io.into();
        assert!(matches!(err, DomainError::Persistence { .. }));
    }

    #[test]
    fn test_cluster_unavailable_counts_as_unresolved() {
        let err = TokenError::ClusterUnavailable {
            message: "connection refused".to_string(),
        };
        assert!(err.is_key_unresolved());
        assert_eq!(err.kind(), "key-unresolved");
        assert!(!TokenError::InvalidSignature.is_key_unresolved());
    }
}
