//! Postgres-backed account directory.

use std::sync::Arc;

use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use coins_accounts::{Account, NewAccount};
use coins_core::AccountId;

use super::store::AccountStore;
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct PostgresAccountStore {
    pool: Arc<PgPool>,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl AccountStore for PostgresAccountStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query("SELECT id, first_name, last_name FROM accounts ORDER BY id ASC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| StoreError::database("list_accounts", e))?;

        let mut accounts = Vec::with_capacity(rows.len());
        for row in rows {
            let record = AccountRow::from_row(&row)
                .map_err(|e| StoreError::database("decode_account", e))?;
            accounts.push(record.into());
        }
        Ok(accounts)
    }

    #[instrument(skip(self), fields(account_id = %id), err)]
    async fn get(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query("SELECT id, first_name, last_name FROM accounts WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| StoreError::database("get_account", e))?;

        match row {
            Some(row) => {
                let record = AccountRow::from_row(&row)
                    .map_err(|e| StoreError::database("decode_account", e))?;
                Ok(Some(record.into()))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, account), err)]
    async fn store(&self, account: NewAccount) -> Result<Account, StoreError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO accounts (first_name, last_name) VALUES ($1, $2) RETURNING id",
        )
        .bind(account.first_name())
        .bind(account.last_name())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| StoreError::database("insert_account", e))?;

        Ok(account.into_account(AccountId::new(id)))
    }
}

#[derive(Debug)]
struct AccountRow {
    id: i64,
    first_name: String,
    last_name: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for AccountRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(AccountRow {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
        })
    }
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: AccountId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}
