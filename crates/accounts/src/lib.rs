//! Account directory domain model.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.

pub mod account;

pub use account::{Account, NewAccount};
