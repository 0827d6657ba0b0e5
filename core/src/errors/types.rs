//! Token error taxonomy
//!
//! Every failure on the token decode path and the server-trust channel is one
//! of these variants. They are logged internally and never surfaced to a
//! client: the token service collapses them all into "unauthenticated".

use thiserror::Error;

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The value does not have the expected shape
    #[error("Invalid token format")]
    InvalidTokenFormat,

    /// The embedded expiry has passed
    #[error("Token expired")]
    TokenExpired,

    /// The recomputed HMAC does not match
    #[error("Invalid signature")]
    InvalidSignature,

    /// No key is available for the referenced server and slot
    #[error("No key for server {server_id} slot {slot}")]
    KeyUnresolved { server_id: String, slot: usize },

    /// Server-trust header presented by a host outside the allow-list
    #[error("Untrusted host: {host}")]
    UntrustedHost { host: String },

    /// The cluster key cache could not be reached
    #[error("Cluster key cache unavailable: {message}")]
    ClusterUnavailable { message: String },
}

impl TokenError {
    /// Short label used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::InvalidTokenFormat => "malformed",
            TokenError::TokenExpired => "expired",
            TokenError::InvalidSignature => "signature-invalid",
            TokenError::KeyUnresolved { .. } => "key-unresolved",
            TokenError::UntrustedHost { .. } => "untrusted-host",
            TokenError::ClusterUnavailable { .. } => "key-unresolved",
        }
    }

    /// Whether the referenced key could not be found, locally or remotely
    pub fn is_key_unresolved(&self) -> bool {
        matches!(
            self,
            TokenError::KeyUnresolved { .. } | TokenError::ClusterUnavailable { .. }
        )
    }
}
