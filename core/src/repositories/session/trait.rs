//! Server-side session marker storage.

use async_trait::async_trait;

use crate::errors::DomainError;

/// Storage for session-mode trusted logins
///
/// In session mode no token leaves the server. The HTTP layer hands out an
/// opaque session id and the authenticated user id is kept here.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Record `user_id` under `session_id`, living for `ttl_secs`
    async fn set(&self, session_id: &str, user_id: &str, ttl_secs: u64)
        -> Result<(), DomainError>;

    /// Fetch the user id recorded for `session_id`
    async fn get(&self, session_id: &str) -> Result<Option<String>, DomainError>;

    /// Forget `session_id`
    ///
    /// # Returns
    /// * `Ok(true)` - A marker was removed
    /// * `Ok(false)` - There was nothing to remove
    async fn remove(&self, session_id: &str) -> Result<bool, DomainError>;
}
