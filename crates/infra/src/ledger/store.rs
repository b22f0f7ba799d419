use std::sync::Arc;

use chrono::{DateTime, Utc};

use coins_core::AccountId;
use coins_payments::{Balance, NewTransaction, Transaction};

use crate::error::StoreError;

/// One atomic, all-or-nothing group of ledger reads and writes.
///
/// ## Locking
///
/// `try_lock` takes a per-account lock scoped to this unit of work. It never
/// waits: `Ok(false)` means another in-flight unit of work holds the lock.
/// Locks are released when the unit of work commits, rolls back, or is
/// dropped unfinished. Re-locking an account already held by the same unit
/// of work succeeds.
///
/// ## Visibility
///
/// Nothing written here is visible to other readers until `commit`. A unit
/// of work dropped without `commit` behaves exactly like `rollback`, which
/// makes request cancellation safe.
///
/// After `commit` or `rollback` every method returns `StoreError::Finished`.
#[async_trait::async_trait]
pub trait UnitOfWork: Send {
    /// Moment the unit of work began; used as the transaction timestamp.
    fn started_at(&self) -> DateTime<Utc>;

    async fn try_lock(&mut self, account_id: AccountId) -> Result<bool, StoreError>;

    /// Current balance as seen by this unit of work (zero if never stored).
    async fn balance(&mut self, account_id: AccountId) -> Result<Balance, StoreError>;

    /// Upsert a balance. The caller must hold the account's lock.
    async fn put_balance(&mut self, balance: &Balance) -> Result<(), StoreError>;

    /// Append a transaction record and return it with its assigned id.
    async fn append_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<Transaction, StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn rollback(&mut self) -> Result<(), StoreError>;
}

/// Durable balances + append-only transaction ledger.
///
/// Mutations only happen through a `UnitOfWork` obtained from `begin`. The
/// read methods take no locks and only ever observe committed state.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;

    /// Committed balance of an account (zero if never stored).
    async fn balance(&self, account_id: AccountId) -> Result<Balance, StoreError>;

    /// Transactions where the account is sender or receiver, oldest first.
    async fn list_transactions(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError>;
}

#[async_trait::async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        (**self).begin().await
    }

    async fn balance(&self, account_id: AccountId) -> Result<Balance, StoreError> {
        (**self).balance(account_id).await
    }

    async fn list_transactions(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError> {
        (**self).list_transactions(account_id).await
    }
}
