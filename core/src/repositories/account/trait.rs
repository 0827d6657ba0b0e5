//! Account existence check.

use async_trait::async_trait;

use crate::errors::DomainError;

/// Answers whether a user id still maps to a live account
///
/// Consulted only after a token has decoded successfully, so a token for a
/// deleted account stops authenticating even though its signature is valid.
#[async_trait]
pub trait AccountValidator: Send + Sync {
    async fn exists(&self, user_id: &str) -> Result<bool, DomainError>;
}
