//! Postgres-backed ledger store.
//!
//! Account locks are transaction-scoped advisory locks
//! (`pg_try_advisory_xact_lock`), keyed by the account id. Postgres releases
//! them on commit or rollback, and an unfinished `sqlx::Transaction` rolls
//! back when dropped, so every exit path (including a cancelled request)
//! releases the locks and discards staged writes. Because the locks live in
//! the database they hold across any number of server instances.
//!
//! Schema: see `crate::db::SCHEMA`.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction as PgTransaction};
use tracing::instrument;

use coins_core::{AccountId, TransactionId};
use coins_payments::{Balance, NewTransaction, Transaction};

use super::store::{LedgerStore, UnitOfWork};
use crate::error::StoreError;

/// Postgres-backed balances and transaction ledger.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::database("begin_transaction", e))?;

        // TIMESTAMPTZ keeps microseconds; truncate so the returned record
        // matches what a later read sees.
        Ok(Box::new(PostgresUnitOfWork {
            tx: Some(tx),
            started_at: Utc::now().trunc_subsecs(6),
        }))
    }

    #[instrument(skip(self), fields(account_id = %account_id), err)]
    async fn balance(&self, account_id: AccountId) -> Result<Balance, StoreError> {
        let amount: Option<Decimal> =
            sqlx::query_scalar("SELECT balance FROM balances WHERE account_id = $1")
                .bind(account_id.get())
                .fetch_optional(&*self.pool)
                .await
                .map_err(|e| StoreError::database("get_balance", e))?;

        Ok(Balance::new(account_id, amount.unwrap_or(Decimal::ZERO)))
    }

    #[instrument(skip(self), fields(account_id = %account_id), err)]
    async fn list_transactions(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, from_account, to_account, amount, date
            FROM transactions
            WHERE from_account = $1 OR to_account = $1
            ORDER BY date ASC, id ASC
            "#,
        )
        .bind(account_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| StoreError::database("list_transactions", e))?;

        let mut transactions = Vec::with_capacity(rows.len());
        for row in rows {
            let record = TransactionRow::from_row(&row)
                .map_err(|e| StoreError::database("decode_transaction", e))?;
            transactions.push(record.into());
        }

        Ok(transactions)
    }
}

/// Unit of work backed by one Postgres transaction.
#[derive(Debug)]
pub struct PostgresUnitOfWork {
    /// `None` once committed or rolled back.
    tx: Option<PgTransaction<'static, Postgres>>,
    started_at: DateTime<Utc>,
}

impl PostgresUnitOfWork {
    fn tx(&mut self) -> Result<&mut PgTransaction<'static, Postgres>, StoreError> {
        self.tx.as_mut().ok_or(StoreError::Finished)
    }
}

#[async_trait::async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    async fn try_lock(&mut self, account_id: AccountId) -> Result<bool, StoreError> {
        let tx = self.tx()?;
        sqlx::query_scalar::<_, bool>("SELECT pg_try_advisory_xact_lock($1)")
            .bind(account_id.get())
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| StoreError::database("try_advisory_lock", e))
    }

    async fn balance(&mut self, account_id: AccountId) -> Result<Balance, StoreError> {
        let tx = self.tx()?;
        let amount: Option<Decimal> =
            sqlx::query_scalar("SELECT balance FROM balances WHERE account_id = $1")
                .bind(account_id.get())
                .fetch_optional(&mut **tx)
                .await
                .map_err(|e| StoreError::database("get_balance", e))?;

        Ok(Balance::new(account_id, amount.unwrap_or(Decimal::ZERO)))
    }

    async fn put_balance(&mut self, balance: &Balance) -> Result<(), StoreError> {
        let tx = self.tx()?;
        sqlx::query(
            r#"
            INSERT INTO balances (account_id, balance)
            VALUES ($1, $2)
            ON CONFLICT (account_id)
            DO UPDATE SET balance = EXCLUDED.balance
            "#,
        )
        .bind(balance.account_id.get())
        .bind(balance.amount)
        .execute(&mut **tx)
        .await
        .map_err(|e| StoreError::database("put_balance", e))?;

        Ok(())
    }

    async fn append_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<Transaction, StoreError> {
        let tx = self.tx()?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO transactions (from_account, to_account, amount, date)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(transaction.from.get())
        .bind(transaction.to.get())
        .bind(transaction.amount)
        .bind(transaction.date)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| StoreError::database("insert_transaction", e))?;

        Ok(transaction.into_transaction(TransactionId::new(id)))
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::Finished)?;
        tx.commit()
            .await
            .map_err(|e| StoreError::database("commit_transaction", e))
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::Finished)?;
        tx.rollback()
            .await
            .map_err(|e| StoreError::database("rollback", e))
    }
}

// SQLx row types

#[derive(Debug)]
struct TransactionRow {
    id: i64,
    from_account: i64,
    to_account: i64,
    amount: Decimal,
    date: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for TransactionRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(TransactionRow {
            id: row.try_get("id")?,
            from_account: row.try_get("from_account")?,
            to_account: row.try_get("to_account")?,
            amount: row.try_get("amount")?,
            date: row.try_get("date")?,
        })
    }
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Transaction {
            id: TransactionId::new(row.id),
            from: AccountId::new(row.from_account),
            to: AccountId::new(row.to_account),
            amount: row.amount,
            date: row.date,
        }
    }
}

/// Runs only when `COINS_TEST_PG_URI` points at a scratch database.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn store() -> Option<PostgresLedgerStore> {
        let url = std::env::var("COINS_TEST_PG_URI").ok()?;
        let pool = PgPool::connect(&url).await.expect("connect to test database");
        db::ensure_schema(&pool).await.expect("create schema");
        Some(PostgresLedgerStore::new(pool))
    }

    fn unique_account() -> AccountId {
        // Keep test runs from colliding on advisory lock keys and balance rows.
        AccountId::new(Utc::now().timestamp_nanos_opt().unwrap_or_default())
    }

    #[tokio::test]
    async fn advisory_lock_is_exclusive_until_commit() {
        let Some(store) = store().await else { return };
        let account = unique_account();

        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();
        assert!(first.try_lock(account).await.unwrap());
        assert!(!second.try_lock(account).await.unwrap());

        first.commit().await.unwrap();
        assert!(second.try_lock(account).await.unwrap());
        second.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn dropped_unit_of_work_leaves_no_balance() {
        let Some(store) = store().await else { return };
        let account = unique_account();

        {
            let mut uow = store.begin().await.unwrap();
            assert!(uow.try_lock(account).await.unwrap());
            uow.put_balance(&Balance::new(account, Decimal::from(5)))
                .await
                .unwrap();
        }

        assert_eq!(store.balance(account).await.unwrap().amount, Decimal::ZERO);
    }
}
