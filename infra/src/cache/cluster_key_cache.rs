//! Redis-backed cluster key store
//!
//! Every node publishes its signing keys here so peers can verify the tokens
//! it issues. Key pattern:
//! - `trusted:key:{server_id}:{slot}` - JSON encoded `ExpiringSecretKey`
//!
//! Entries carry a Redis TTL equal to the key's remaining lifetime, so the
//! cache never holds a key past its expiry.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use ta_core::domain::entities::ExpiringSecretKey;
use ta_core::errors::DomainError;
use ta_core::repositories::ClusterKeyStore;
use ta_core::services::Clock;

use crate::cache::RedisClient;
use crate::InfrastructureError;

/// Cluster key store over Redis
#[derive(Clone)]
pub struct RedisClusterKeyStore {
    redis_client: RedisClient,
    clock: Arc<dyn Clock>,
}

impl RedisClusterKeyStore {
    pub fn new(redis_client: RedisClient, clock: Arc<dyn Clock>) -> Self {
        Self {
            redis_client,
            clock,
        }
    }

    fn entry_key(&self, server_id: &str, slot: usize) -> String {
        self.redis_client.key(&entry_key(server_id, slot))
    }
}

/// Unprefixed cache key for a replicated slot
pub(crate) fn entry_key(server_id: &str, slot: usize) -> String {
    format!("trusted:key:{}:{}", server_id, slot)
}

#[async_trait]
impl ClusterKeyStore for RedisClusterKeyStore {
    async fn put(
        &self,
        server_id: &str,
        slot: usize,
        key: &ExpiringSecretKey,
    ) -> Result<(), DomainError> {
        let ttl = key.remaining_secs(self.clock.now_millis());
        if ttl == 0 {
            debug!(server_id, slot, "Not publishing an already expired key");
            return Ok(());
        }

        let value = serde_json::to_string(key).map_err(InfrastructureError::from)?;
        self.redis_client
            .set_with_expiry(&self.entry_key(server_id, slot), &value, ttl)
            .await?;

        debug!(server_id, slot, ttl, "Published signing key");
        Ok(())
    }

    async fn get(
        &self,
        server_id: &str,
        slot: usize,
    ) -> Result<Option<ExpiringSecretKey>, DomainError> {
        let Some(value) = self.redis_client.get(&self.entry_key(server_id, slot)).await? else {
            return Ok(None);
        };

        let key = serde_json::from_str(&value).map_err(InfrastructureError::from)?;
        Ok(Some(key))
    }
}
