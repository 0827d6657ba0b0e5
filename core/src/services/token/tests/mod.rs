//! Tests for the trusted token module

mod service_tests;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;
use ta_shared::config::TrustedTokenConfig;

use crate::domain::entities::ExpiringSecretKey;
use crate::errors::DomainError;
use crate::repositories::{ClusterKeyStore, InMemoryClusterKeyStore};
use crate::services::clock::ManualClock;
use crate::services::token::KeyRing;

pub(super) const TTL: i64 = 1_200_000;

/// Token configuration with the stock TTL and no key ring file
pub(super) fn token_config(server_id: &str) -> TrustedTokenConfig {
    TrustedTokenConfig {
        ttl_ms: TTL,
        token_file: String::new(),
        ..TrustedTokenConfig::new(server_id)
    }
}

pub(super) fn key_ring(
    server_id: &str,
    cluster: Arc<dyn ClusterKeyStore>,
    clock: Arc<ManualClock>,
) -> Arc<KeyRing> {
    Arc::new(KeyRing::new(&token_config(server_id), cluster, clock).unwrap())
}

pub(super) fn shared_cluster() -> Arc<InMemoryClusterKeyStore> {
    Arc::new(InMemoryClusterKeyStore::new())
}

/// Cluster store that is never reachable
pub(super) struct UnreachableClusterStore;

#[async_trait]
impl ClusterKeyStore for UnreachableClusterStore {
    async fn put(
        &self,
        _server_id: &str,
        _slot: usize,
        _key: &ExpiringSecretKey,
    ) -> Result<(), DomainError> {
        Err(DomainError::Internal {
            message: "connection refused".to_string(),
        })
    }

    async fn get(
        &self,
        _server_id: &str,
        _slot: usize,
    ) -> Result<Option<ExpiringSecretKey>, DomainError> {
        Err(DomainError::Internal {
            message: "connection refused".to_string(),
        })
    }
}

/// Cluster store whose `put` hangs while stalled, until released
#[derive(Default)]
pub(super) struct StalledClusterStore {
    pub(super) inner: InMemoryClusterKeyStore,
    stalled: AtomicBool,
    release: Notify,
}

impl StalledClusterStore {
    pub(super) fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    pub(super) fn release(&self) {
        self.stalled.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
        self.release.notify_one();
    }
}

#[async_trait]
impl ClusterKeyStore for StalledClusterStore {
    async fn put(
        &self,
        server_id: &str,
        slot: usize,
        key: &ExpiringSecretKey,
    ) -> Result<(), DomainError> {
        if self.stalled.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        self.inner.put(server_id, slot, key).await
    }

    async fn get(
        &self,
        server_id: &str,
        slot: usize,
    ) -> Result<Option<ExpiringSecretKey>, DomainError> {
        self.inner.get(server_id, slot).await
    }
}
