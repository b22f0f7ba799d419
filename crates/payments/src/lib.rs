//! Payments module (balances, transfers, top-ups).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. The
//! transactional protocol that applies these requests lives in `coins-infra`.

pub mod balance;
pub mod error;
pub mod request;
pub mod transaction;

pub use balance::Balance;
pub use error::{ErrorKind, PaymentError, PaymentResult};
pub use request::{TopUpRequest, TransferRequest};
pub use transaction::{NewTransaction, Transaction};
