//! Main token service implementation

use std::sync::Arc;

use rand::{rngs::OsRng, RngCore};
use tracing::{debug, info, warn};

use crate::domain::value_objects::{
    Authentication, CredentialSource, IssuedToken, LoginOutcome, PresentedCookie,
    PresentedCredentials, Revocation, TrustedUser,
};
use crate::errors::{DomainResult, TokenError};
use crate::repositories::{AccountValidator, SessionStore};
use crate::services::clock::Clock;

use super::codec::TokenCodec;
use super::config::{TokenServiceConfig, REVOKED_COOKIE_VALUE};
use super::key_ring::KeyRing;
use super::server_trust::ServerTrustValidator;

/// Issues, validates, refreshes and revokes trusted tokens
///
/// Every decode failure is logged and collapsed into "not authenticated";
/// callers never learn which check failed.
pub struct TokenService {
    config: TokenServiceConfig,
    key_ring: Arc<KeyRing>,
    codec: TokenCodec,
    server_trust: ServerTrustValidator,
    sessions: Arc<dyn SessionStore>,
    accounts: Arc<dyn AccountValidator>,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Creates a new token service instance
    ///
    /// # Arguments
    ///
    /// * `config` - Token and server trust configuration
    /// * `key_ring` - This server's key ring
    /// * `sessions` - Storage for session-mode markers
    /// * `accounts` - Account existence check run after a token decodes
    /// * `clock` - Time source shared with the key ring
    pub fn new(
        config: TokenServiceConfig,
        key_ring: Arc<KeyRing>,
        sessions: Arc<dyn SessionStore>,
        accounts: Arc<dyn AccountValidator>,
        clock: Arc<dyn Clock>,
    ) -> DomainResult<Self> {
        config.validate()?;
        let server_trust = ServerTrustValidator::new(&config.server_trust);

        Ok(Self {
            codec: TokenCodec::new(clock.clone()),
            config,
            key_ring,
            server_trust,
            sessions,
            accounts,
            clock,
        })
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    pub fn server_trust(&self) -> &ServerTrustValidator {
        &self.server_trust
    }

    /// Issue credentials for a user the caller has already authenticated
    pub async fn issue(&self, user_id: &str) -> DomainResult<IssuedToken> {
        if self.config.token.uses_session() {
            let session_id = new_session_id();
            self.sessions
                .set(&session_id, user_id, self.config.session_ttl_secs)
                .await?;
            info!(user_id = %user_id, "Stored trusted credentials in session");
            return Ok(IssuedToken::Session(session_id));
        }

        let token = self.issue_token(user_id).await?;
        debug!(user_id = %user_id, "Issued trusted token");
        Ok(IssuedToken::Cookie(token))
    }

    /// Establish who sent a request, if anyone
    ///
    /// The server-trust header wins when it checks out. Otherwise the session
    /// marker (session mode) or the token cookies (cookie mode) are consulted.
    pub async fn validate(&self, credentials: &PresentedCredentials) -> Option<TrustedUser> {
        self.identify(credentials).await.map(|(user, _)| user)
    }

    /// Reissue `token` for `user_id` once less than half its TTL remains
    pub async fn refresh(&self, token: &str, user_id: &str) -> DomainResult<Option<String>> {
        let Some(expires_at) = TokenCodec::peek_expiry(token) else {
            return Ok(None);
        };

        let now = self.clock.now_millis();
        if now + self.config.refresh_window_ms() > expires_at {
            let fresh = self.issue_token(user_id).await?;
            debug!(user_id = %user_id, "Refreshed trusted token");
            return Ok(Some(fresh));
        }
        Ok(None)
    }

    /// Validate a request and refresh a cookie-borne token when due
    pub async fn authenticate(&self, credentials: &PresentedCredentials) -> Authentication {
        let Some((user, token)) = self.identify(credentials).await else {
            return Authentication::anonymous();
        };

        let mut refreshed = None;
        if let Some(token) = token {
            match self.refresh(token, &user.user_id).await {
                Ok(token) => refreshed = token,
                Err(e) => warn!(
                    user_id = %user.user_id,
                    error = %e,
                    "Failed to refresh trusted token"
                ),
            }
        }

        Authentication {
            user: Some(user),
            refreshed,
        }
    }

    /// Drop the credentials held for a client
    pub async fn revoke(&self, session_id: Option<&str>) -> DomainResult<Revocation> {
        if !self.config.token.uses_session() {
            return Ok(Revocation::ExpireCookie(REVOKED_COOKIE_VALUE.to_string()));
        }

        if let Some(session_id) = session_id {
            if self.sessions.remove(session_id).await? {
                info!("Cleared trusted credentials from session");
            }
        }
        Ok(Revocation::SessionCleared)
    }

    /// Check a server-trust header from a peer known as `hosts`
    pub fn validate_server_trust(&self, header: &str, hosts: &[String]) -> Result<String, TokenError> {
        self.server_trust.validate(header, hosts)
    }

    /// Trusted-login flow: the caller vouches for `user_id`
    ///
    /// Credentials are issued only if the account exists.
    pub async fn login(&self, user_id: &str) -> DomainResult<LoginOutcome> {
        if !self.accounts.exists(user_id).await? {
            info!(user_id = %user_id, "Trusted login for unknown user");
            return Ok(LoginOutcome::UnknownUser);
        }
        Ok(LoginOutcome::Issued(self.issue(user_id).await?))
    }

    async fn issue_token(&self, user_id: &str) -> DomainResult<String> {
        let active = self.key_ring.active_key().await?;
        let expires_at = self.clock.now_millis() + self.config.token.ttl_ms;
        Ok(self.codec.encode(expires_at, user_id, &active)?)
    }

    fn validate_header(&self, credentials: &PresentedCredentials) -> Option<TrustedUser> {
        if !self.server_trust.is_enabled() {
            return None;
        }
        let header = credentials.server_token.as_deref()?.trim();
        if header.is_empty() {
            return None;
        }
        self.server_trust
            .validate(header, &credentials.remote_hosts)
            .ok()
            .map(|user_id| TrustedUser::new(user_id, CredentialSource::ServerToken))
    }

    async fn validate_session(&self, credentials: &PresentedCredentials) -> Option<TrustedUser> {
        let session_id = credentials.session_id.as_deref()?;
        match self.sessions.get(session_id).await {
            Ok(user_id) => user_id.map(|u| TrustedUser::new(u, CredentialSource::Session)),
            Err(e) => {
                warn!(error = %e, "Session lookup failed");
                None
            }
        }
    }

    /// The user a request proves, plus the token cookie that proved it
    async fn identify<'a>(
        &self,
        credentials: &'a PresentedCredentials,
    ) -> Option<(TrustedUser, Option<&'a str>)> {
        if let Some(user) = self.validate_header(credentials) {
            return Some((user, None));
        }

        if self.config.token.uses_session() {
            return self.validate_session(credentials).await.map(|user| (user, None));
        }

        for cookie in &credentials.cookies {
            if let Some(user) = self.validate_cookie(cookie).await {
                return Some((user, Some(cookie.value.as_str())));
            }
        }
        None
    }

    async fn validate_cookie(&self, cookie: &PresentedCookie) -> Option<TrustedUser> {
        if self.config.token.secure_cookie && !cookie.secure {
            debug!("Ignoring trusted token cookie sent over an insecure channel");
            return None;
        }

        let user_id = match self.codec.decode(&cookie.value, self.key_ring.as_ref()).await {
            Ok(user_id) => user_id,
            Err(e) => {
                debug!(kind = e.kind(), "Rejected trusted token");
                return None;
            }
        };

        match self.accounts.exists(&user_id).await {
            Ok(true) => Some(TrustedUser::new(user_id, CredentialSource::Cookie)),
            Ok(false) => {
                info!(user_id = %user_id, "Trusted token names an account that no longer exists");
                None
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Account lookup failed");
                None
            }
        }
    }
}

fn new_session_id() -> String {
    let mut bytes = [0u8; 24];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
