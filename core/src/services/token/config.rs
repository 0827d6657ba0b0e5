//! Configuration for the token service

use ta_shared::config::{AuthConfig, ServerTrustConfig, TrustedTokenConfig};

use crate::errors::DomainResult;

/// Value the revoked token cookie is overwritten with
pub const REVOKED_COOKIE_VALUE: &str = "invalid";

/// Configuration for the token service
///
/// Built once at startup and never changed afterwards.
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// Token storage, TTL, cookie and key ring settings
    pub token: TrustedTokenConfig,
    /// Shared-secret channel settings
    pub server_trust: ServerTrustConfig,
    /// Lifetime of a session marker in seconds
    pub session_ttl_secs: u64,
}

impl TokenServiceConfig {
    pub fn new(token: TrustedTokenConfig, server_trust: ServerTrustConfig) -> Self {
        Self {
            token,
            server_trust,
            session_ttl_secs: 3600,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        self.token.validate()?;
        Ok(())
    }

    /// Remaining lifetime below which a presented token is reissued
    pub fn refresh_window_ms(&self) -> i64 {
        self.token.ttl_ms / 2
    }
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self::new(TrustedTokenConfig::default(), ServerTrustConfig::default())
    }
}

impl From<&AuthConfig> for TokenServiceConfig {
    fn from(auth: &AuthConfig) -> Self {
        Self {
            token: auth.token.clone(),
            server_trust: auth.server_trust.clone(),
            session_ttl_secs: auth.session.timeout,
        }
    }
}
