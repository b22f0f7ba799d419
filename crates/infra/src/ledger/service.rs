//! Ledger API consumed by the transport layer.

use rust_decimal::Decimal;
use tracing::instrument;

use coins_core::AccountId;
use coins_payments::{Balance, PaymentResult, TopUpRequest, Transaction, TransferRequest};

use super::coordinator::TransferCoordinator;
use super::store::LedgerStore;
use crate::accounts::AccountLookup;

/// Balance queries, history, transfers and top-ups, with account resolution.
///
/// Requests are validated first (amount, self-transfer), then every referenced
/// account is resolved through `AccountLookup` (`NotFound` otherwise), and
/// only then does the coordinator touch the ledger.
#[derive(Debug, Clone)]
pub struct LedgerService<S, A> {
    coordinator: TransferCoordinator<S>,
    accounts: A,
}

impl<S, A> LedgerService<S, A>
where
    S: LedgerStore,
    A: AccountLookup,
{
    pub fn new(store: S, accounts: A) -> Self {
        Self {
            coordinator: TransferCoordinator::new(store),
            accounts,
        }
    }

    #[instrument(skip(self), fields(account_id = %account_id), err)]
    pub async fn get_balance(&self, account_id: AccountId) -> PaymentResult<Balance> {
        self.accounts.resolve(account_id).await?;
        Ok(self.coordinator.store().balance(account_id).await?)
    }

    #[instrument(skip(self), fields(account_id = %account_id), err)]
    pub async fn list_transactions(
        &self,
        account_id: AccountId,
    ) -> PaymentResult<Vec<Transaction>> {
        self.accounts.resolve(account_id).await?;
        Ok(self
            .coordinator
            .store()
            .list_transactions(account_id)
            .await?)
    }

    pub async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> PaymentResult<Transaction> {
        let request = TransferRequest::new(from, to, amount)?;
        self.accounts.resolve(from).await?;
        self.accounts.resolve(to).await?;
        self.coordinator.transfer(request).await
    }

    pub async fn top_up(&self, account_id: AccountId, amount: Decimal) -> PaymentResult<Balance> {
        let request = TopUpRequest::new(account_id, amount)?;
        self.accounts.resolve(account_id).await?;
        self.coordinator.top_up(request).await
    }
}
