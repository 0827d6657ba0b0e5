//! Redis-backed session marker storage
//!
//! Key pattern:
//! - `trusted:session:{session_id}` - authenticated user id

use async_trait::async_trait;
use tracing::debug;

use ta_core::errors::DomainError;
use ta_core::repositories::SessionStore;

use crate::cache::RedisClient;

/// Session store over Redis, shared by every node in the cluster
#[derive(Clone)]
pub struct RedisSessionStore {
    redis_client: RedisClient,
}

impl RedisSessionStore {
    pub fn new(redis_client: RedisClient) -> Self {
        Self { redis_client }
    }

    fn session_key(&self, session_id: &str) -> String {
        self.redis_client.key(&session_key(session_id))
    }
}

/// Unprefixed cache key for a session marker
pub(crate) fn session_key(session_id: &str) -> String {
    format!("trusted:session:{}", session_id)
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn set(
        &self,
        session_id: &str,
        user_id: &str,
        ttl_secs: u64,
    ) -> Result<(), DomainError> {
        self.redis_client
            .set_with_expiry(&self.session_key(session_id), user_id, ttl_secs.max(1))
            .await?;
        debug!("Stored session marker");
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<String>, DomainError> {
        Ok(self.redis_client.get(&self.session_key(session_id)).await?)
    }

    async fn remove(&self, session_id: &str) -> Result<bool, DomainError> {
        Ok(self.redis_client.delete(&self.session_key(session_id)).await?)
    }
}
