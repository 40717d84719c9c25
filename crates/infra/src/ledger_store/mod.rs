//! Append-only ledger store boundary.
//!
//! The ledger is the source of truth for stock. This module defines the storage
//! abstraction (no storage assumptions) and an in-memory implementation.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use r#trait::{LedgerSnapshot, LedgerStore, LedgerStoreError, RemovedEntry};
