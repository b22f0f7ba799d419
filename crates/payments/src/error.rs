//! Ledger API error model.
//!
//! Every failure path of the ledger returns one of these variants. The
//! transport layer maps `ErrorKind` to its own status codes; it never needs to
//! inspect messages.

use thiserror::Error;

use coins_core::{AccountId, DomainError};

pub type PaymentResult<T> = Result<T, PaymentError>;

/// Coarse classification carried through the Ledger API.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InsufficientFunds,
    LockUnavailable,
    Validation,
    Infrastructure,
}

impl ErrorKind {
    /// Whether a caller may reasonably retry the same request later.
    pub fn is_transient(self) -> bool {
        matches!(self, ErrorKind::LockUnavailable)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Referenced account does not exist.
    #[error("account with ID {account_id} not found")]
    NotFound { account_id: AccountId },

    /// Source balance was below the requested amount at check time.
    #[error("insufficient funds, account with ID {account_id}")]
    InsufficientFunds { account_id: AccountId },

    /// Another unit of work holds the account lock.
    #[error("unable to acquire lock for account with ID {account_id}")]
    LockUnavailable { account_id: AccountId },

    /// Request rejected before touching the store.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Backing store failure; the unit of work was rolled back.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl PaymentError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn infrastructure(msg: impl Into<String>) -> Self {
        Self::Infrastructure(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::NotFound { .. } => ErrorKind::NotFound,
            PaymentError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            PaymentError::LockUnavailable { .. } => ErrorKind::LockUnavailable,
            PaymentError::Validation(_) => ErrorKind::Validation,
            PaymentError::Infrastructure(_) => ErrorKind::Infrastructure,
        }
    }
}

impl From<DomainError> for PaymentError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                PaymentError::Validation(msg)
            }
        }
    }
}
