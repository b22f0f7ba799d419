use std::sync::Arc;

use coins_accounts::{Account, NewAccount};
use coins_core::AccountId;
use coins_payments::{PaymentError, PaymentResult};

use crate::error::StoreError;

/// Account directory storage.
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    /// All accounts, ascending by id.
    async fn list(&self) -> Result<Vec<Account>, StoreError>;

    async fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Persist a new account; the store assigns its id.
    async fn store(&self, account: NewAccount) -> Result<Account, StoreError>;
}

#[async_trait::async_trait]
impl<S> AccountStore for Arc<S>
where
    S: AccountStore + ?Sized,
{
    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        (**self).list().await
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        (**self).get(id).await
    }

    async fn store(&self, account: NewAccount) -> Result<Account, StoreError> {
        (**self).store(account).await
    }
}

/// Resolve an account identifier to an existing account.
///
/// This is the only thing the ledger needs from the account directory.
#[async_trait::async_trait]
pub trait AccountLookup: Send + Sync {
    async fn resolve(&self, id: AccountId) -> PaymentResult<Account>;
}

#[async_trait::async_trait]
impl<S> AccountLookup for S
where
    S: AccountStore + ?Sized,
{
    async fn resolve(&self, id: AccountId) -> PaymentResult<Account> {
        self.get(id)
            .await?
            .ok_or(PaymentError::NotFound { account_id: id })
    }
}
