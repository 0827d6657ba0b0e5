//! Time-bounded symmetric signing keys held in the key ring.

use serde::{Deserialize, Serialize};

/// Length of freshly generated key material in bytes
pub const KEY_LENGTH: usize = 20;

/// MAC algorithm a key is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    #[serde(rename = "HmacSHA1")]
    HmacSha1,
}

impl Default for KeyAlgorithm {
    fn default() -> Self {
        KeyAlgorithm::HmacSha1
    }
}

/// A secret key with an absolute expiry (epoch milliseconds)
///
/// The same value is stored in a key ring slot and replicated to the cluster
/// key cache. Key bytes are hex encoded when serialized and never printed by
/// `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiringSecretKey {
    #[serde(with = "hex::serde")]
    key: Vec<u8>,
    #[serde(default)]
    algorithm: KeyAlgorithm,
    expires_at: i64,
}

impl ExpiringSecretKey {
    /// Wrap existing key material
    pub fn new(key: Vec<u8>, expires_at: i64) -> Self {
        Self {
            key,
            algorithm: KeyAlgorithm::HmacSha1,
            expires_at,
        }
    }

    /// Raw key bytes
    pub fn key_bytes(&self) -> &[u8] {
        &self.key
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Expiry in epoch milliseconds
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// A key is usable up to and including its expiry instant
    pub fn has_expired(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at
    }

    /// Remaining lifetime in whole seconds, rounded up, zero once expired
    pub fn remaining_secs(&self, now_ms: i64) -> u64 {
        let remaining = self.expires_at - now_ms;
        if remaining <= 0 {
            0
        } else {
            ((remaining + 999) / 1000) as u64
        }
    }
}

impl std::fmt::Debug for ExpiringSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringSecretKey")
            .field("algorithm", &self.algorithm)
            .field("key_len", &self.key.len())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
