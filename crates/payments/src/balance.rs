use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use coins_core::AccountId;

use crate::error::{PaymentError, PaymentResult};

/// Balance of a single account.
///
/// An account without a stored row has a zero balance; that is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub account_id: AccountId,
    #[serde(rename = "balance", with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl Balance {
    pub fn new(account_id: AccountId, amount: Decimal) -> Self {
        Self { account_id, amount }
    }

    pub fn zero(account_id: AccountId) -> Self {
        Self::new(account_id, Decimal::ZERO)
    }

    pub fn can_cover(&self, amount: Decimal) -> bool {
        self.amount >= amount
    }

    /// Balance after crediting `amount`; fails if the result is not representable.
    pub fn credited(&self, amount: Decimal) -> PaymentResult<Self> {
        self.amount
            .checked_add(amount)
            .map(|total| Self::new(self.account_id, total))
            .ok_or_else(|| PaymentError::validation("amount overflows balance"))
    }

    /// Balance after debiting `amount`. Callers check `can_cover` first.
    pub fn debited(&self, amount: Decimal) -> PaymentResult<Self> {
        self.amount
            .checked_sub(amount)
            .map(|rest| Self::new(self.account_id, rest))
            .ok_or_else(|| PaymentError::validation("amount overflows balance"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_balance_covers_nothing_positive() {
        let b = Balance::zero(AccountId::new(1));
        assert!(b.can_cover(Decimal::ZERO));
        assert!(!b.can_cover(Decimal::new(1, 2)));
    }

    #[test]
    fn debit_and_credit_adjust_amount() {
        let b = Balance::new(AccountId::new(1), Decimal::from(100));
        assert_eq!(b.debited(Decimal::from(40)).unwrap().amount, Decimal::from(60));
        assert_eq!(b.credited(Decimal::new(255, 1)).unwrap().amount, Decimal::new(1255, 1));
    }

    #[test]
    fn credit_past_decimal_range_is_rejected() {
        let b = Balance::new(AccountId::new(1), Decimal::MAX);
        let err = b.credited(Decimal::ONE).unwrap_err();
        assert!(matches!(err, PaymentError::Validation(_)));

        let b = Balance::new(AccountId::new(1), Decimal::MIN);
        assert!(b.debited(Decimal::ONE).is_err());
    }

    #[test]
    fn serializes_with_numeric_balance() {
        let b = Balance::new(AccountId::new(3), Decimal::new(250, 1));
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json["account_id"], 3);
        assert_eq!(json["balance"].as_f64(), Some(25.0));
    }
}
