use std::collections::BTreeMap;
use std::sync::RwLock;

use coins_accounts::{Account, NewAccount};
use coins_core::AccountId;

use super::store::AccountStore;
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Directory {
    accounts: BTreeMap<AccountId, Account>,
    last_id: i64,
}

/// In-memory account directory.
///
/// Intended for tests/dev. Ids are assigned sequentially starting at 1.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    inner: RwLock<Directory>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let directory = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(directory.accounts.values().cloned().collect())
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let directory = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(directory.accounts.get(&id).cloned())
    }

    async fn store(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut directory = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        directory.last_id += 1;
        let account = account.into_account(AccountId::new(directory.last_id));
        directory.accounts.insert(account.id, account.clone());
        Ok(account)
    }
}
