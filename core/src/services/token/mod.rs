//! Trusted token module
//!
//! - Rotating key ring with local persistence and cluster replication
//! - Token codec (HMAC-SHA1 signed, self-describing tokens)
//! - Server-trust header validation
//! - Token service orchestrating issue, validate, refresh and revoke

mod codec;
mod config;
mod key_ring;
mod persistence;
mod server_trust;
mod service;

#[cfg(test)]
mod tests;

pub use codec::TokenCodec;
pub use config::{TokenServiceConfig, REVOKED_COOKIE_VALUE};
pub use key_ring::{ActiveKey, KeyResolver, KeyRing, RingState};
pub use persistence::KeyRingFile;
pub use server_trust::ServerTrustValidator;
pub use service::TokenService;
