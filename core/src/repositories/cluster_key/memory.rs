//! In-process cluster key store

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::ExpiringSecretKey;
use crate::errors::DomainError;

use super::ClusterKeyStore;

/// Cluster key store backed by a shared map
///
/// Used on single-node deployments and in tests. Clones share the same map,
/// so handing one clone to each of several key rings simulates a cluster.
#[derive(Clone, Default)]
pub struct InMemoryClusterKeyStore {
    entries: Arc<RwLock<HashMap<(String, usize), ExpiringSecretKey>>>,
}

impl InMemoryClusterKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of replicated entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop every entry, as if the cache had been flushed
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl ClusterKeyStore for InMemoryClusterKeyStore {
    async fn put(
        &self,
        server_id: &str,
        slot: usize,
        key: &ExpiringSecretKey,
    ) -> Result<(), DomainError> {
        let mut entries = self.entries.write().await;
        entries.insert((server_id.to_string(), slot), key.clone());
        Ok(())
    }

    async fn get(
        &self,
        server_id: &str,
        slot: usize,
    ) -> Result<Option<ExpiringSecretKey>, DomainError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(server_id.to_string(), slot)).cloned())
    }
}
