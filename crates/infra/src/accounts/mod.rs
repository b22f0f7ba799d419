//! Account directory storage and the `AccountLookup` capability.

pub mod in_memory;
pub mod postgres;
pub mod store;

pub use in_memory::InMemoryAccountStore;
pub use postgres::PostgresAccountStore;
pub use store::{AccountLookup, AccountStore};
