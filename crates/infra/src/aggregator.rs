//! Stock aggregation: the current balance of a product as Σ inbound − Σ outbound.
//!
//! Two implementations exist:
//! - [`LedgerScan`] derives balances on demand from the ledger store (always correct,
//!   cost grows with history)
//! - [`crate::projections::StockProjection`] keeps a running counter per product,
//!   updated inside the engine's per-product critical section
//!
//! The engine serves reads from the projection and uses the scan to verify it.

use std::collections::HashMap;

use stockledger_core::ProductId;
use stockledger_inventory::{balance_from_entries, balances_from_entries};

use crate::ledger_store::{LedgerStore, LedgerStoreError};

/// Read side of stock balances.
pub trait StockAggregator: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Balance of one product; 0 when nothing touched it.
    fn balance_of(&self, product_id: ProductId) -> Result<i64, Self::Error>;

    /// Balances of `product_ids` in one pass. Every requested id is present in the
    /// result, with 0 for products without movements.
    fn balances_for_all(&self, product_ids: &[ProductId]) -> Result<HashMap<ProductId, i64>, Self::Error>;
}

/// On-demand aggregation over the ledger store.
#[derive(Debug, Clone)]
pub struct LedgerScan<S> {
    store: S,
}

impl<S> LedgerScan<S>
where
    S: LedgerStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> StockAggregator for LedgerScan<S>
where
    S: LedgerStore,
{
    type Error = LedgerStoreError;

    fn balance_of(&self, product_id: ProductId) -> Result<i64, Self::Error> {
        let entries = self.store.list_by_product(product_id)?;
        Ok(balance_from_entries(product_id, &entries))
    }

    fn balances_for_all(&self, product_ids: &[ProductId]) -> Result<HashMap<ProductId, i64>, Self::Error> {
        let entries = self.store.list_all()?;
        let all = balances_from_entries(&entries);
        Ok(product_ids
            .iter()
            .map(|id| (*id, all.get(id).copied().unwrap_or(0)))
            .collect())
    }
}
