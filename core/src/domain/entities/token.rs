//! Trusted token and server-trust credential entities.
//!
//! A trusted token has no server-side record. Everything needed to validate it
//! travels in the string itself:
//!
//! ```text
//! <hex hmac>@<slot digit><expiry ms>@<user id>@<server id>
//! ```

use crate::errors::TokenError;

/// Separator between the fields of a trusted token
pub const TOKEN_SEPARATOR: char = '@';

/// Separator between the fields of a server-trust header
pub const SERVER_TOKEN_SEPARATOR: char = ';';

/// Name of the server-trust header
pub const SERVER_TOKEN_HEADER: &str = "x-sakai-token";

/// Highest slot index the single-digit slot field can carry
pub const MAX_SLOT: usize = 9;

/// The signed fields of a trusted token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPayload {
    /// Key ring slot of the signing key
    pub slot: usize,
    /// Expiry in epoch milliseconds
    pub expires_at: i64,
    /// Authenticated user
    pub user_id: String,
    /// Server whose key ring signed the token
    pub server_id: String,
}

impl TokenPayload {
    pub fn new(
        slot: usize,
        expires_at: i64,
        user_id: impl Into<String>,
        server_id: impl Into<String>,
    ) -> Self {
        Self {
            slot,
            expires_at,
            user_id: user_id.into(),
            server_id: server_id.into(),
        }
    }

    /// Check that the payload can be written and read back unambiguously
    pub fn validate(&self) -> Result<(), TokenError> {
        if self.slot > MAX_SLOT || self.expires_at < 0 {
            return Err(TokenError::InvalidTokenFormat);
        }
        if !is_valid_field(&self.user_id) || !is_valid_field(&self.server_id) {
            return Err(TokenError::InvalidTokenFormat);
        }
        Ok(())
    }

    /// The exact string the signature is computed over
    pub fn to_payload_string(&self) -> String {
        format!(
            "{}{}{}{}{}{}",
            self.slot,
            self.expires_at,
            TOKEN_SEPARATOR,
            self.user_id,
            TOKEN_SEPARATOR,
            self.server_id
        )
    }

    /// Whether the token is past its expiry at `now_ms`
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }
}

/// A parsed, not yet verified, trusted token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    /// Hex encoded HMAC as presented
    pub signature: String,
    pub payload: TokenPayload,
}

impl SignedToken {
    /// Split a token string into signature and payload
    pub fn parse(value: &str) -> Result<Self, TokenError> {
        let parts: Vec<&str> = value.split(TOKEN_SEPARATOR).collect();
        if parts.len() != 4 || parts.iter().any(|p| p.is_empty()) {
            return Err(TokenError::InvalidTokenFormat);
        }

        let head = parts[1];
        if head.len() < 2 || !head.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TokenError::InvalidTokenFormat);
        }
        let slot = usize::from(head.as_bytes()[0] - b'0');
        let expires_at: i64 = head[1..]
            .parse()
            .map_err(|_| TokenError::InvalidTokenFormat)?;

        Ok(Self {
            signature: parts[0].to_string(),
            payload: TokenPayload::new(slot, expires_at, parts[2], parts[3]),
        })
    }

    /// Render the full token string
    pub fn to_token_string(&self) -> String {
        format!(
            "{}{}{}",
            self.signature,
            TOKEN_SEPARATOR,
            self.payload.to_payload_string()
        )
    }
}

/// Parsed `x-sakai-token` header: `<hex hmac>;<user id>;<timestamp ms>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTrustCredential {
    pub signature: String,
    pub user_id: String,
    pub timestamp: i64,
}

impl ServerTrustCredential {
    /// Parse a header value
    pub fn parse(header: &str) -> Result<Self, TokenError> {
        let parts: Vec<&str> = header.trim().split(SERVER_TOKEN_SEPARATOR).collect();
        if parts.len() != 3 {
            return Err(TokenError::InvalidTokenFormat);
        }
        let signature = parts[0].trim();
        let user_id = parts[1].trim();
        if signature.is_empty() || user_id.is_empty() {
            return Err(TokenError::InvalidTokenFormat);
        }
        let timestamp = parts[2]
            .trim()
            .parse()
            .map_err(|_| TokenError::InvalidTokenFormat)?;

        Ok(Self {
            signature: signature.to_string(),
            user_id: user_id.to_string(),
            timestamp,
        })
    }

    /// The string the shared-secret HMAC is computed over
    pub fn message(user_id: &str, timestamp: i64) -> String {
        format!("{}{}{}", user_id, SERVER_TOKEN_SEPARATOR, timestamp)
    }
}

fn is_valid_field(value: &str) -> bool {
    !value.is_empty() && !value.contains(TOKEN_SEPARATOR)
}
