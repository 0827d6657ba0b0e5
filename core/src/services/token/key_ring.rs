//! Rotating ring of signing keys for one server process
//!
//! The ring holds `ring_size` slots. One slot is active and signs new tokens;
//! the others keep older keys around until their own expiry so tokens they
//! signed stay verifiable. Rotation happens every `TTL/2` and each key lives
//! for `2×TTL`, so any live token always finds its key.
//!
//! Every rotation publishes the new key to the cluster key store, which is how
//! other nodes verify tokens this node issued, and saves the ring to disk.

use std::sync::Arc;

use async_trait::async_trait;
use rand::{rngs::OsRng, RngCore};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use ta_shared::config::TrustedTokenConfig;

use crate::domain::entities::{ExpiringSecretKey, KEY_LENGTH};
use crate::errors::{DomainResult, TokenError};
use crate::repositories::ClusterKeyStore;
use crate::services::clock::Clock;

use super::persistence::KeyRingFile;

/// Snapshot of the ring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingState {
    pub active_slot: usize,
    /// Epoch milliseconds after which the next request rotates
    pub next_rotation_at: i64,
    pub slots: Vec<Option<ExpiringSecretKey>>,
}

impl RingState {
    /// An empty ring; the first use rotates into slot 1
    pub fn fresh(ring_size: usize) -> Self {
        Self {
            active_slot: 0,
            next_rotation_at: 0,
            slots: vec![None; ring_size],
        }
    }

    pub fn active(&self) -> Option<&ExpiringSecretKey> {
        self.slots.get(self.active_slot).and_then(Option::as_ref)
    }

    pub fn needs_rotation(&self, now_ms: i64) -> bool {
        now_ms > self.next_rotation_at || self.active().map_or(true, |k| k.has_expired(now_ms))
    }
}

/// The key a new token is signed with, and where to find it again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveKey {
    pub server_id: String,
    pub slot: usize,
    pub key: ExpiringSecretKey,
}

/// Lookup of a signing key by the `(server_id, slot)` a token names
#[async_trait]
pub trait KeyResolver: Send + Sync {
    /// # Returns
    /// * `Ok(Some(key))` - A key that has not expired
    /// * `Ok(None)` - Nothing usable under that slot
    /// * `Err(TokenError::ClusterUnavailable)` - A peer's key could not be fetched
    async fn resolve(
        &self,
        server_id: &str,
        slot: usize,
    ) -> Result<Option<ExpiringSecretKey>, TokenError>;
}

/// One server's key ring
///
/// `state` is only ever locked for in-memory reads and writes. `rotation`
/// serialises loading and rotating so exactly one task generates each key;
/// cluster round trips happen after both locks are released.
pub struct KeyRing {
    server_id: String,
    ttl_ms: i64,
    ring_size: usize,
    file: Option<KeyRingFile>,
    cluster: Arc<dyn ClusterKeyStore>,
    clock: Arc<dyn Clock>,
    /// `None` until first use
    state: RwLock<Option<RingState>>,
    rotation: Mutex<()>,
}

impl KeyRing {
    /// Build a ring from the token configuration
    ///
    /// Nothing is read from disk here; the ring loads lazily on first use or
    /// on [`KeyRing::initialize`]. An empty `token_file` disables persistence.
    pub fn new(
        config: &TrustedTokenConfig,
        cluster: Arc<dyn ClusterKeyStore>,
        clock: Arc<dyn Clock>,
    ) -> DomainResult<Self> {
        config.validate()?;

        let file = if config.token_file.trim().is_empty() {
            None
        } else {
            Some(KeyRingFile::new(config.token_file.trim()))
        };

        Ok(Self {
            server_id: config.server_id.clone(),
            ttl_ms: config.ttl_ms,
            ring_size: config.ring_size,
            file,
            cluster,
            clock,
            state: RwLock::new(None),
            rotation: Mutex::new(()),
        })
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// Load the ring and run the first rotation check
    pub async fn initialize(&self) -> DomainResult<()> {
        let active = self.active_key().await?;
        info!(
            server_id = %self.server_id,
            slot = active.slot,
            "Trusted token key ring ready"
        );
        Ok(())
    }

    /// The key new tokens should be signed with, rotating first if due
    pub async fn active_key(&self) -> DomainResult<ActiveKey> {
        self.ensure_loaded().await;
        if let Some(active) = self.current_active(self.clock.now_millis()).await {
            return Ok(active);
        }

        let rotated = {
            let _rotation = self.rotation.lock().await;

            // Another task may have rotated while this one waited
            let now = self.clock.now_millis();
            if let Some(active) = self.current_active(now).await {
                return Ok(active);
            }

            let mut state = self
                .state
                .read()
                .await
                .clone()
                .unwrap_or_else(|| RingState::fresh(self.ring_size));
            let rotated = self.rotate(&mut state, now);
            self.persist(&state);
            *self.state.write().await = Some(state);
            rotated
        };

        self.publish(&rotated).await;
        Ok(rotated)
    }

    /// Find the key for `(server_id, slot)`, locally or in the cluster store
    ///
    /// Expired keys are never returned. Local lookups never wait on the
    /// cluster store.
    pub async fn key(
        &self,
        server_id: &str,
        slot: usize,
    ) -> Result<Option<ExpiringSecretKey>, TokenError> {
        let now = self.clock.now_millis();

        if server_id == self.server_id {
            self.ensure_loaded().await;
            let guard = self.state.read().await;
            return Ok(guard
                .as_ref()
                .and_then(|state| state.slots.get(slot))
                .and_then(Option::as_ref)
                .filter(|key| !key.has_expired(now))
                .cloned());
        }

        let remote = self
            .cluster
            .get(server_id, slot)
            .await
            .map_err(|e| TokenError::ClusterUnavailable {
                message: e.to_string(),
            })?;

        Ok(remote.filter(|key| !key.has_expired(now)))
    }

    /// Copy of the current ring, loading it if needed
    pub async fn snapshot(&self) -> RingState {
        self.ensure_loaded().await;
        self.state
            .read()
            .await
            .clone()
            .unwrap_or_else(|| RingState::fresh(self.ring_size))
    }

    async fn current_active(&self, now: i64) -> Option<ActiveKey> {
        let guard = self.state.read().await;
        let state = guard.as_ref()?;
        if state.needs_rotation(now) {
            return None;
        }
        state.active().map(|key| ActiveKey {
            server_id: self.server_id.clone(),
            slot: state.active_slot,
            key: key.clone(),
        })
    }

    /// Install a new key in the next slot; the caller persists and publishes
    fn rotate(&self, state: &mut RingState, now: i64) -> ActiveKey {
        let mut bytes = vec![0u8; KEY_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        let key = ExpiringSecretKey::new(bytes, now + 2 * self.ttl_ms);

        let slot = (state.active_slot + 1) % self.ring_size;
        state.slots[slot] = Some(key.clone());
        state.active_slot = slot;
        state.next_rotation_at = now + self.ttl_ms / 2;

        info!(
            server_id = %self.server_id,
            slot,
            expires_at = key.expires_at(),
            next_rotation_at = state.next_rotation_at,
            "Rotated trusted token signing key"
        );

        ActiveKey {
            server_id: self.server_id.clone(),
            slot,
            key,
        }
    }

    async fn publish(&self, active: &ActiveKey) {
        if let Err(e) = self.cluster.put(&self.server_id, active.slot, &active.key).await {
            warn!(
                server_id = %self.server_id,
                slot = active.slot,
                error = %e,
                "Failed to publish signing key to cluster store"
            );
        }
    }

    fn persist(&self, state: &RingState) {
        let Some(file) = &self.file else {
            return;
        };
        match file.save(state) {
            Ok(()) => debug!(path = %file.path().display(), "Saved key ring"),
            Err(e) => warn!(
                path = %file.path().display(),
                error = %e,
                "Failed to save key ring, continuing in memory"
            ),
        }
    }

    /// Load the ring on first use; the loading task republishes restored keys
    async fn ensure_loaded(&self) {
        if self.state.read().await.is_some() {
            return;
        }

        let restored = {
            let _rotation = self.rotation.lock().await;
            if self.state.read().await.is_some() {
                return;
            }
            let (state, restored) = self.load_state();
            let republish = restored.then(|| state.clone());
            *self.state.write().await = Some(state);
            republish
        };

        if let Some(state) = restored {
            self.republish(&state).await;
        }
    }

    /// The ring from disk, or a fresh one; `true` when it came from disk
    fn load_state(&self) -> (RingState, bool) {
        let restored = match &self.file {
            None => None,
            Some(file) => match file.load(self.ring_size) {
                Ok(state) => state,
                Err(e) => {
                    warn!(
                        path = %file.path().display(),
                        error = %e,
                        "Discarding unreadable key ring, starting fresh"
                    );
                    None
                }
            },
        };

        match restored {
            Some(state) => (state, true),
            None => (RingState::fresh(self.ring_size), false),
        }
    }

    /// Push every live restored key back to the cluster store
    async fn republish(&self, state: &RingState) {
        let now = self.clock.now_millis();
        let mut published = 0usize;
        for (slot, key) in state.slots.iter().enumerate() {
            let Some(key) = key else { continue };
            if key.has_expired(now) {
                continue;
            }
            match self.cluster.put(&self.server_id, slot, key).await {
                Ok(()) => published += 1,
                Err(e) => warn!(
                    server_id = %self.server_id,
                    slot,
                    error = %e,
                    "Failed to republish restored signing key"
                ),
            }
        }
        info!(
            server_id = %self.server_id,
            active_slot = state.active_slot,
            published,
            "Restored key ring from disk"
        );
    }
}

#[async_trait]
impl KeyResolver for KeyRing {
    async fn resolve(
        &self,
        server_id: &str,
        slot: usize,
    ) -> Result<Option<ExpiringSecretKey>, TokenError> {
        self.key(server_id, slot).await
    }
}
