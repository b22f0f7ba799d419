use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use coins_core::{AccountId, TransactionId};
use coins_payments::{Balance, NewTransaction, Transaction};

use super::store::{LedgerStore, UnitOfWork};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<AccountId, Decimal>,
    transactions: Vec<Transaction>,
    last_transaction_id: i64,
    /// Accounts locked by some in-flight unit of work.
    locked: HashSet<AccountId>,
}

fn lock_state(state: &Mutex<LedgerState>) -> Result<MutexGuard<'_, LedgerState>, StoreError> {
    state.lock().map_err(|_| StoreError::Poisoned)
}

/// In-memory ledger store.
///
/// Intended for tests/dev. Mirrors the Postgres store's semantics: per-account
/// try-locks scoped to a unit of work, staged writes that only become visible
/// on commit, and a non-negative balance check at commit time.
///
/// The internal mutex only guards short critical sections and is never held
/// across an await point.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of every committed balance.
    pub fn total_balance(&self) -> Result<Decimal, StoreError> {
        let state = lock_state(&self.state)?;
        state
            .balances
            .values()
            .try_fold(Decimal::ZERO, |total, amount| total.checked_add(*amount))
            .ok_or_else(|| StoreError::Database {
                operation: "total_balance",
                message: "sum of balances overflows".to_string(),
            })
    }

    /// Number of account locks currently held by in-flight units of work.
    pub fn held_locks(&self) -> Result<usize, StoreError> {
        Ok(lock_state(&self.state)?.locked.len())
    }
}

#[async_trait::async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        Ok(Box::new(InMemoryUnitOfWork {
            state: Arc::clone(&self.state),
            started_at: Utc::now(),
            held: Vec::new(),
            staged_balances: HashMap::new(),
            staged_transactions: Vec::new(),
            finished: false,
        }))
    }

    async fn balance(&self, account_id: AccountId) -> Result<Balance, StoreError> {
        let state = lock_state(&self.state)?;
        Ok(state
            .balances
            .get(&account_id)
            .map(|amount| Balance::new(account_id, *amount))
            .unwrap_or_else(|| Balance::zero(account_id)))
    }

    async fn list_transactions(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError> {
        let state = lock_state(&self.state)?;
        let mut transactions: Vec<Transaction> = state
            .transactions
            .iter()
            .filter(|t| t.involves(account_id))
            .cloned()
            .collect();
        transactions.sort_by_key(|t| (t.date, t.id));
        Ok(transactions)
    }
}

/// Unit of work over `InMemoryLedgerStore`.
#[derive(Debug)]
pub struct InMemoryUnitOfWork {
    state: Arc<Mutex<LedgerState>>,
    started_at: DateTime<Utc>,
    held: Vec<AccountId>,
    staged_balances: HashMap<AccountId, Decimal>,
    staged_transactions: Vec<Transaction>,
    finished: bool,
}

impl InMemoryUnitOfWork {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.finished {
            return Err(StoreError::Finished);
        }
        Ok(())
    }

    fn release(&mut self, state: &mut LedgerState) {
        for account_id in self.held.drain(..) {
            state.locked.remove(&account_id);
        }
        self.staged_balances.clear();
        self.staged_transactions.clear();
        self.finished = true;
    }
}

#[async_trait::async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    async fn try_lock(&mut self, account_id: AccountId) -> Result<bool, StoreError> {
        self.ensure_open()?;
        if self.held.contains(&account_id) {
            return Ok(true);
        }

        let mut state = lock_state(&self.state)?;
        if !state.locked.insert(account_id) {
            return Ok(false);
        }
        drop(state);

        self.held.push(account_id);
        Ok(true)
    }

    async fn balance(&mut self, account_id: AccountId) -> Result<Balance, StoreError> {
        self.ensure_open()?;
        if let Some(amount) = self.staged_balances.get(&account_id) {
            return Ok(Balance::new(account_id, *amount));
        }

        let state = lock_state(&self.state)?;
        Ok(state
            .balances
            .get(&account_id)
            .map(|amount| Balance::new(account_id, *amount))
            .unwrap_or_else(|| Balance::zero(account_id)))
    }

    async fn put_balance(&mut self, balance: &Balance) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.staged_balances.insert(balance.account_id, balance.amount);
        Ok(())
    }

    async fn append_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<Transaction, StoreError> {
        self.ensure_open()?;

        // Ids come from a shared sequence; a rolled-back append leaves a gap.
        let id = {
            let mut state = lock_state(&self.state)?;
            state.last_transaction_id += 1;
            TransactionId::new(state.last_transaction_id)
        };

        let committed = transaction.into_transaction(id);
        self.staged_transactions.push(committed.clone());
        Ok(committed)
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        let state_handle = Arc::clone(&self.state);
        let mut state = lock_state(&state_handle)?;

        if let Some((account_id, amount)) = self
            .staged_balances
            .iter()
            .find(|(_, amount)| **amount < Decimal::ZERO)
        {
            let message = format!("balance of account {account_id} would become {amount}");
            self.release(&mut state);
            return Err(StoreError::Database {
                operation: "commit",
                message,
            });
        }

        for (account_id, amount) in self.staged_balances.drain() {
            state.balances.insert(account_id, amount);
        }
        state
            .transactions
            .extend(self.staged_transactions.drain(..));
        self.release(&mut state);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        let state_handle = Arc::clone(&self.state);
        let mut state = lock_state(&state_handle)?;
        self.release(&mut state);
        Ok(())
    }
}

impl Drop for InMemoryUnitOfWork {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let state_handle = Arc::clone(&self.state);
        let mut state = state_handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.release(&mut state);
    }
}
