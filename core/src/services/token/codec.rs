//! Trusted token encoding and verification

use std::sync::Arc;

use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::domain::entities::{SignedToken, TokenPayload};
use crate::errors::TokenError;
use crate::services::clock::Clock;

use super::key_ring::{ActiveKey, KeyResolver};

type HmacSha1 = Hmac<Sha1>;

/// Hex encoded HMAC-SHA1 of `message` under `key`
pub(crate) fn hmac_sha1_hex(key: &[u8], message: &str) -> Result<String, TokenError> {
    // HMAC accepts keys of any length, this only fails on a broken backend
    let mut mac = HmacSha1::new_from_slice(key).map_err(|_| TokenError::InvalidSignature)?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Compare a presented signature against the expected one in constant time
pub(crate) fn signatures_match(expected: &str, presented: &str) -> bool {
    constant_time_eq(expected.as_bytes(), presented.as_bytes())
}

/// Turns user ids into signed tokens and back
#[derive(Clone)]
pub struct TokenCodec {
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Sign a token for `user_id` that expires at `expires_at`
    pub fn encode(
        &self,
        expires_at: i64,
        user_id: &str,
        active: &ActiveKey,
    ) -> Result<String, TokenError> {
        let payload = TokenPayload::new(active.slot, expires_at, user_id, active.server_id.as_str());
        payload.validate()?;

        if active.key.key_bytes().is_empty() {
            return Err(TokenError::KeyUnresolved {
                server_id: active.server_id.clone(),
                slot: active.slot,
            });
        }

        let signature = hmac_sha1_hex(active.key.key_bytes(), &payload.to_payload_string())?;
        Ok(SignedToken { signature, payload }.to_token_string())
    }

    /// Verify a token and return the user id it names
    ///
    /// Expiry is checked before any key lookup, so expired tokens never cause
    /// a cluster round trip.
    pub async fn decode(
        &self,
        value: &str,
        resolver: &dyn KeyResolver,
    ) -> Result<String, TokenError> {
        let token = SignedToken::parse(value)?;
        let payload = &token.payload;

        if payload.is_expired(self.clock.now_millis()) {
            return Err(TokenError::TokenExpired);
        }

        let key = resolver
            .resolve(&payload.server_id, payload.slot)
            .await?
            .ok_or_else(|| TokenError::KeyUnresolved {
                server_id: payload.server_id.clone(),
                slot: payload.slot,
            })?;

        let expected = hmac_sha1_hex(key.key_bytes(), &payload.to_payload_string())?;
        if !signatures_match(&expected, &token.signature) {
            return Err(TokenError::InvalidSignature);
        }

        Ok(token.payload.user_id)
    }

    /// Read the embedded expiry without verifying anything
    pub fn peek_expiry(value: &str) -> Option<i64> {
        SignedToken::parse(value).ok().map(|t| t.payload.expires_at)
    }
}
