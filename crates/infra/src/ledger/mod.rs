//! Balances, account locks and the append-only transaction ledger.
//!
//! `store` defines the storage boundary (`LedgerStore` + `UnitOfWork`),
//! `coordinator` implements the transfer/top-up protocol on top of it, and
//! `service` is the Ledger API handed to the transport layer.

pub mod coordinator;
pub mod in_memory;
pub mod postgres;
pub mod service;
pub mod store;

pub use coordinator::TransferCoordinator;
pub use in_memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
pub use service::LedgerService;
pub use store::{LedgerStore, UnitOfWork};
