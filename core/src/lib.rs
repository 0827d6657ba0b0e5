//! # Trusted Auth Core
//!
//! Core logic of the clustered trusted-authentication subsystem: the rotating
//! key ring, the signed token codec, the server-trust header validator and the
//! token service that orchestrates them. Collaborators (cluster cache, session
//! storage, account lookup, clock) are consumed through traits so that the
//! HTTP and infrastructure layers can plug in concrete implementations.

pub mod domain;
pub mod services;
pub mod repositories;
pub mod errors;

// Re-export commonly used types for convenience
pub use domain::entities::{ExpiringSecretKey, KeyAlgorithm, SignedToken, TokenPayload};
pub use domain::value_objects::{
    Authentication, CredentialSource, IssuedToken, LoginOutcome, PresentedCredentials,
    Revocation, TrustedUser,
};
pub use errors::{DomainError, DomainResult, TokenError};
pub use repositories::{AccountValidator, ClusterKeyStore, SessionStore};
pub use services::{Clock, KeyRing, TokenCodec, TokenService, TokenServiceConfig};
