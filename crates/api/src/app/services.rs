use std::sync::Arc;

use tracing::info;

use coins_infra::StoreError;
use coins_infra::accounts::{AccountStore, InMemoryAccountStore, PostgresAccountStore};
use coins_infra::config::StorageConfig;
use coins_infra::db;
use coins_infra::ledger::{InMemoryLedgerStore, LedgerService, LedgerStore, PostgresLedgerStore};

pub type Ledger = LedgerService<Arc<dyn LedgerStore>, Arc<dyn AccountStore>>;

/// Everything the handlers need, shared behind an `Arc`.
pub struct AppServices {
    pub accounts: Arc<dyn AccountStore>,
    pub ledger: Ledger,
}

impl AppServices {
    pub fn new(accounts: Arc<dyn AccountStore>, ledger_store: Arc<dyn LedgerStore>) -> Self {
        Self {
            ledger: LedgerService::new(ledger_store, Arc::clone(&accounts)),
            accounts,
        }
    }

    /// Process-local stores; state is lost on restart.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryAccountStore::new()),
            Arc::new(InMemoryLedgerStore::new()),
        )
    }
}

/// Wire services for the configured storage backend.
///
/// For Postgres this connects the pool and creates the schema if missing.
pub async fn build_services(storage: &StorageConfig) -> Result<AppServices, StoreError> {
    match storage {
        StorageConfig::InMemory => {
            info!("using in-memory storage");
            Ok(AppServices::in_memory())
        }
        StorageConfig::Postgres(config) => {
            let pool = db::connect(config).await?;
            db::ensure_schema(&pool).await?;
            info!("using postgres storage");
            Ok(AppServices::new(
                Arc::new(PostgresAccountStore::new(pool.clone())),
                Arc::new(PostgresLedgerStore::new(pool)),
            ))
        }
    }
}
