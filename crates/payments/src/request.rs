//! Validated ledger requests.
//!
//! Construction enforces the preconditions the transactional protocol relies
//! on (positive amounts, distinct endpoints), so the coordinator never sees an
//! invalid request.

use rust_decimal::Decimal;

use coins_core::AccountId;

use crate::error::{PaymentError, PaymentResult};

fn ensure_positive(amount: Decimal) -> PaymentResult<()> {
    if amount <= Decimal::ZERO {
        return Err(PaymentError::validation("amount must be positive"));
    }
    Ok(())
}

/// Move `amount` from one account to another.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    from: AccountId,
    to: AccountId,
    amount: Decimal,
}

impl TransferRequest {
    pub fn new(from: AccountId, to: AccountId, amount: Decimal) -> PaymentResult<Self> {
        ensure_positive(amount)?;
        if from == to {
            return Err(PaymentError::validation(format!(
                "cannot transfer from account {from} to itself"
            )));
        }
        Ok(Self { from, to, amount })
    }

    pub fn from(&self) -> AccountId {
        self.from
    }

    pub fn to(&self) -> AccountId {
        self.to
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Accounts in the order their locks must be taken.
    ///
    /// Ascending by id, independent of transfer direction, so two transfers
    /// over the same pair always contend on the same first lock.
    pub fn lock_order(&self) -> [AccountId; 2] {
        if self.from < self.to {
            [self.from, self.to]
        } else {
            [self.to, self.from]
        }
    }
}

/// Credit `amount` to a single account.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TopUpRequest {
    account_id: AccountId,
    amount: Decimal,
}

impl TopUpRequest {
    pub fn new(account_id: AccountId, amount: Decimal) -> PaymentResult<Self> {
        ensure_positive(amount)?;
        Ok(Self { account_id, amount })
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }
}
