use thiserror::Error;

use coins_payments::PaymentError;

/// Storage operation error.
///
/// These are **infrastructure errors** (connectivity, query failures, broken
/// in-memory state) as opposed to domain errors. The Ledger API reports all
/// of them as `PaymentError::Infrastructure`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    #[error("connection pool closed in {0}")]
    PoolClosed(&'static str),

    #[error("lock poisoned")]
    Poisoned,

    #[error("unit of work already finished")]
    Finished,
}

impl StoreError {
    pub(crate) fn database(operation: &'static str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => StoreError::PoolClosed(operation),
            sqlx::Error::Database(db_err) => StoreError::Database {
                operation,
                message: db_err.message().to_string(),
            },
            other => StoreError::Database {
                operation,
                message: other.to_string(),
            },
        }
    }
}

impl From<StoreError> for PaymentError {
    fn from(value: StoreError) -> Self {
        PaymentError::infrastructure(value.to_string())
    }
}
