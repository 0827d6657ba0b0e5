//! Account validator over a fixed set of user ids

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::errors::DomainError;
use super::AccountValidator;

/// Known accounts held in memory; accounts can be removed at runtime
#[derive(Clone, Default)]
pub struct InMemoryAccountValidator {
    accounts: Arc<RwLock<HashSet<String>>>,
}

impl InMemoryAccountValidator {
    pub fn new<I, S>(accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accounts: Arc::new(RwLock::new(accounts.into_iter().map(Into::into).collect())),
        }
    }

    pub async fn add(&self, user_id: &str) {
        self.accounts.write().await.insert(user_id.to_string());
    }

    pub async fn remove(&self, user_id: &str) -> bool {
        self.accounts.write().await.remove(user_id)
    }
}

#[async_trait]
impl AccountValidator for InMemoryAccountValidator {
    async fn exists(&self, user_id: &str) -> Result<bool, DomainError> {
        Ok(self.accounts.read().await.contains(user_id))
    }
}
