use rust_decimal::Decimal;
use serde::Deserialize;

use coins_core::AccountId;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from: AccountId,
    pub to: AccountId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    pub account_id: AccountId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}
