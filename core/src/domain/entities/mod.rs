//! Domain entities: signing keys and token payloads.

pub mod secret_key;
pub mod token;

// Re-export commonly used types
pub use secret_key::{ExpiringSecretKey, KeyAlgorithm, KEY_LENGTH};
pub use token::{
    ServerTrustCredential, SignedToken, TokenPayload, MAX_SLOT, SERVER_TOKEN_HEADER,
    SERVER_TOKEN_SEPARATOR, TOKEN_SEPARATOR,
};
