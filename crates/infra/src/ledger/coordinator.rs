//! Transfer and top-up protocol.
//!
//! Every mutating ledger operation runs inside exactly one `UnitOfWork`:
//!
//! ```text
//! begin
//!   ↓
//! lock accounts (ascending id, non-blocking)   ── busy ──→ LockUnavailable
//!   ↓
//! read source balance, check funds             ── short ─→ InsufficientFunds
//!   ↓
//! debit source → read destination → credit destination
//!   ↓
//! append transaction
//!   ↓
//! commit
//! ```
//!
//! Any failure after `begin` rolls the unit of work back, so either all three
//! writes (debit, credit, append) land or none do. The coordinator never
//! retries; contention is reported to the caller.
//!
//! Account existence is not checked here; `LedgerService` resolves accounts
//! before calling in.

use tracing::{error, info, instrument, warn};

use coins_core::AccountId;
use coins_payments::{
    Balance, NewTransaction, PaymentError, PaymentResult, TopUpRequest, Transaction,
    TransferRequest,
};

use super::store::{LedgerStore, UnitOfWork};

/// Applies validated transfer and top-up requests against a `LedgerStore`.
#[derive(Debug, Clone)]
pub struct TransferCoordinator<S> {
    store: S,
}

impl<S> TransferCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> TransferCoordinator<S>
where
    S: LedgerStore,
{
    #[instrument(
        skip(self, request),
        fields(from = %request.from(), to = %request.to(), amount = %request.amount()),
        err
    )]
    pub async fn transfer(&self, request: TransferRequest) -> PaymentResult<Transaction> {
        let mut uow = self.store.begin().await?;
        let outcome = apply_transfer(uow.as_mut(), &request).await;
        let committed = finish(uow.as_mut(), outcome).await?;

        info!(transaction_id = %committed.id, "transfer committed");
        Ok(committed)
    }

    #[instrument(
        skip(self, request),
        fields(account_id = %request.account_id(), amount = %request.amount()),
        err
    )]
    pub async fn top_up(&self, request: TopUpRequest) -> PaymentResult<Balance> {
        let mut uow = self.store.begin().await?;
        let outcome = apply_top_up(uow.as_mut(), &request).await;
        let balance = finish(uow.as_mut(), outcome).await?;

        info!(balance = %balance.amount, "top-up committed");
        Ok(balance)
    }
}

async fn apply_transfer(
    uow: &mut dyn UnitOfWork,
    request: &TransferRequest,
) -> PaymentResult<Transaction> {
    let date = uow.started_at();

    for account_id in request.lock_order() {
        acquire(uow, account_id).await?;
    }

    let source = uow.balance(request.from()).await?;
    if !source.can_cover(request.amount()) {
        info!(account_id = %request.from(), balance = %source.amount, "insufficient funds");
        return Err(PaymentError::InsufficientFunds {
            account_id: request.from(),
        });
    }
    uow.put_balance(&source.debited(request.amount())?).await?;

    let destination = uow.balance(request.to()).await?;
    uow.put_balance(&destination.credited(request.amount())?).await?;

    let transaction = uow
        .append_transaction(NewTransaction {
            from: request.from(),
            to: request.to(),
            amount: request.amount(),
            date,
        })
        .await?;

    Ok(transaction)
}

async fn apply_top_up(uow: &mut dyn UnitOfWork, request: &TopUpRequest) -> PaymentResult<Balance> {
    acquire(uow, request.account_id()).await?;

    let updated = uow
        .balance(request.account_id())
        .await?
        .credited(request.amount())?;
    uow.put_balance(&updated).await?;

    Ok(updated)
}

async fn acquire(uow: &mut dyn UnitOfWork, account_id: AccountId) -> PaymentResult<()> {
    if uow.try_lock(account_id).await? {
        return Ok(());
    }

    warn!(account_id = %account_id, "account lock unavailable");
    Err(PaymentError::LockUnavailable { account_id })
}

/// Commit on success, roll back on failure.
///
/// A failed rollback is logged and the original error returned; the store
/// discards the unit of work either way.
async fn finish<T>(uow: &mut dyn UnitOfWork, outcome: PaymentResult<T>) -> PaymentResult<T> {
    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                error!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
