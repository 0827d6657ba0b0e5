//! Account validator that trusts every user id

use async_trait::async_trait;

use crate::errors::DomainError;
use super::AccountValidator;

/// Used when no user directory is wired in
pub struct AcceptAllAccounts;

impl AcceptAllAccounts {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AcceptAllAccounts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountValidator for AcceptAllAccounts {
    async fn exists(&self, _user_id: &str) -> Result<bool, DomainError> {
        Ok(true)
    }
}
