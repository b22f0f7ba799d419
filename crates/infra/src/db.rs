//! Postgres connection pool and schema.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::StoreError;

/// Tables used by the account directory and the ledger.
///
/// `balances` has one row per account ever touched by a top-up or transfer;
/// a missing row means zero. `transactions` is append-only and indexed by
/// both endpoints for per-account history.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id         BIGSERIAL PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS balances (
    account_id BIGINT PRIMARY KEY,
    balance    NUMERIC NOT NULL DEFAULT 0 CHECK (balance >= 0)
);

CREATE TABLE IF NOT EXISTS transactions (
    id           BIGSERIAL PRIMARY KEY,
    from_account BIGINT NOT NULL,
    to_account   BIGINT NOT NULL,
    amount       NUMERIC NOT NULL CHECK (amount > 0),
    date         TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS transactions_from_account_idx ON transactions (from_account, date);
CREATE INDEX IF NOT EXISTS transactions_to_account_idx ON transactions (to_account, date);
"#;

/// Build the shared connection pool from configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.url)
        .await
        .map_err(|e| StoreError::database("connect", e))?;

    info!(max_connections = config.max_connections, "connected to postgres");
    Ok(pool)
}

/// Create tables and indexes if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| StoreError::database("ensure_schema", e))?;
    Ok(())
}
