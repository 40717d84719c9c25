use std::sync::Arc;

use stockledger_infra::{InMemoryCatalog, InMemoryLedgerStore, LedgerCommandError, LedgerConfig, StockLedger};

pub type InMemoryStockLedger = StockLedger<Arc<InMemoryLedgerStore>, Arc<InMemoryCatalog>>;

/// Shared handles for the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    ledger: Arc<InMemoryStockLedger>,
    catalog: Arc<InMemoryCatalog>,
}

pub fn build_services(config: &LedgerConfig) -> Result<AppServices, LedgerCommandError> {
    // In-memory wiring: the catalog and the ledger store are injected into the engine.
    let store = Arc::new(InMemoryLedgerStore::new());
    let catalog = Arc::new(InMemoryCatalog::new());
    let ledger = StockLedger::new(store, catalog.clone(), config)?;

    Ok(AppServices {
        ledger: Arc::new(ledger),
        catalog,
    })
}

impl AppServices {
    pub fn catalog(&self) -> &InMemoryCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &InMemoryStockLedger {
        &self.ledger
    }

    /// Run a ledger operation off the async workers.
    ///
    /// Writes wait on per-product locks, which must not stall the runtime.
    pub async fn with_ledger<T, F>(&self, f: F) -> Result<T, tokio::task::JoinError>
    where
        F: FnOnce(&InMemoryStockLedger) -> T + Send + 'static,
        T: Send + 'static,
    {
        let ledger = self.ledger.clone();
        tokio::task::spawn_blocking(move || f(&ledger)).await
    }
}
