//! Projection implementations (read model builders).
//!
//! Projections consume ledger events and keep query-optimized read models. They are
//! rebuildable from the ledger and idempotent per revision.

pub mod stock;

pub use stock::{StockProjection, StockProjectionError};
