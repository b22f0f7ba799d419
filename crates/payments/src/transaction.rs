use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use coins_core::{AccountId, TransactionId};

/// A committed fund movement between two accounts (immutable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub from: AccountId,
    pub to: AccountId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

impl Transaction {
    pub fn involves(&self, account_id: AccountId) -> bool {
        self.from == account_id || self.to == account_id
    }
}

/// A transaction ready to be appended (not yet assigned an id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
}

impl NewTransaction {
    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            from: self.from,
            to: self.to,
            amount: self.amount,
            date: self.date,
        }
    }
}
