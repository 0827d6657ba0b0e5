//! Contract for the cluster-replicated key cache.

use async_trait::async_trait;

use crate::domain::entities::ExpiringSecretKey;
use crate::errors::DomainError;

/// Cluster-wide replica of every node's key ring slots
///
/// Entries are keyed by `(server_id, slot)`. The store is eventually
/// consistent: a `get` right after a peer's `put` may still miss, and callers
/// treat a miss as "key unresolved" rather than as an error.
#[async_trait]
pub trait ClusterKeyStore: Send + Sync {
    /// Publish a key under `(server_id, slot)`, replacing any previous entry
    ///
    /// # Returns
    /// * `Ok(())` - Accepted by the store
    /// * `Err(DomainError)` - The store could not be reached
    async fn put(
        &self,
        server_id: &str,
        slot: usize,
        key: &ExpiringSecretKey,
    ) -> Result<(), DomainError>;

    /// Look up the key a peer published for `(server_id, slot)`
    ///
    /// # Returns
    /// * `Ok(Some(key))` - An entry is present (it may still be expired)
    /// * `Ok(None)` - Nothing replicated under that slot
    /// * `Err(DomainError)` - The store could not be reached
    async fn get(
        &self,
        server_id: &str,
        slot: usize,
    ) -> Result<Option<ExpiringSecretKey>, DomainError>;
}
