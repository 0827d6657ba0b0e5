//! Authenticated identity value objects.

use serde::{Deserialize, Serialize};

/// Which channel proved the identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// A signed trusted token carried in a cookie
    Cookie,
    /// A server-side session marker
    Session,
    /// A server-trust header signed with the shared secret
    ServerToken,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Cookie => write!(f, "cookie"),
            CredentialSource::Session => write!(f, "session"),
            CredentialSource::ServerToken => write!(f, "server_token"),
        }
    }
}

/// A user whose identity has been established by one of the trusted channels
///
/// This carries no authorization decision. Whether the user may act is up to
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedUser {
    pub user_id: String,
    pub source: CredentialSource,
}

impl TrustedUser {
    pub fn new(user_id: impl Into<String>, source: CredentialSource) -> Self {
        Self {
            user_id: user_id.into(),
            source,
        }
    }
}

/// Result of running the validate-then-refresh pipeline on a request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Authentication {
    /// The identity, if any credential checked out
    pub user: Option<TrustedUser>,
    /// A reissued token to send back in place of the presented one
    pub refreshed: Option<String>,
}

impl Authentication {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// What the HTTP layer must hand back after issuing credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuedToken {
    /// Set this value as the trusted-token cookie
    Cookie(String),
    /// Set this id as the session cookie; the marker lives server side
    Session(String),
}

/// What the HTTP layer must do to drop credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revocation {
    /// Overwrite the trusted-token cookie with this value and expire it
    ExpireCookie(String),
    /// The session marker was removed; expire the session cookie
    SessionCleared,
}

/// Outcome of the trusted-login flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The account validator does not know this user
    UnknownUser,
    Issued(IssuedToken),
}
