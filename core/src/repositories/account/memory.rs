//! In-memory account directory

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::account::{Account, AccountStatus};
use crate::errors::DomainError;

use super::trait_::AccountDirectory;

/// Account directory backed by a map, for tests and local runs
pub struct InMemoryAccountDirectory {
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
}

impl InMemoryAccountDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Add or replace an account
    pub async fn insert(&self, account: Account) -> Account {
        let mut accounts = self.accounts.write().await;
        accounts.insert(account.id, account.clone());
        account
    }
}

impl Default for InMemoryAccountDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn find_by_id(&self, owner_id: Uuid) -> Result<Option<Account>, DomainError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&owner_id).cloned())
    }

    async fn change_status(
        &self,
        owner_id: Uuid,
        status: AccountStatus,
    ) -> Result<bool, DomainError> {
        let mut accounts = self.accounts.write().await;
        match accounts.get_mut(&owner_id) {
            Some(account) => {
                account.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
