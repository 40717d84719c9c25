//! Infrastructure layer: ledger storage, stock aggregation, the write engine and its
//! configuration.

pub mod aggregator;
pub mod catalog;
pub mod config;
pub mod ledger_store;
pub mod locks;
pub mod projections;
pub mod receipts;
pub mod stock_ledger;


pub use aggregator::{LedgerScan, StockAggregator};
pub use catalog::InMemoryCatalog;
pub use config::LedgerConfig;
pub use ledger_store::{InMemoryLedgerStore, LedgerSnapshot, LedgerStore, LedgerStoreError, RemovedEntry};
pub use locks::{LockPoisoned, ProductLockGuard, ProductLocks};
pub use projections::{StockProjection, StockProjectionError};
pub use receipts::ReceiptSequence;
pub use stock_ledger::{LedgerCommandError, StockDrift, StockLedger};
