//! In-process session store

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::errors::DomainError;

use super::SessionStore;

struct SessionEntry {
    user_id: String,
    expires_at: Instant,
}

/// Session store kept in a map, entries lapse after their TTL
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn set(
        &self,
        session_id: &str,
        user_id: &str,
        ttl_secs: u64,
    ) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            session_id.to_string(),
            SessionEntry {
                user_id: user_id.to_string(),
                expires_at: Instant::now() + Duration::from_secs(ttl_secs),
            },
        );
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<String>, DomainError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_id)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.user_id.clone()))
    }

    async fn remove(&self, session_id: &str) -> Result<bool, DomainError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(session_id).is_some())
    }
}
