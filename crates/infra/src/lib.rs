//! Infrastructure layer: stores, the transfer protocol, configuration.

pub mod accounts;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;

pub use error::StoreError;
