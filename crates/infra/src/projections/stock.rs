use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use stockledger_core::ProductId;
use stockledger_events::{EventEnvelope, Projection};
use stockledger_inventory::{LedgerEntry, LedgerEvent, balances_from_entries};

use crate::aggregator::StockAggregator;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockProjectionError {
    #[error("stock projection lock poisoned")]
    Poisoned,

    #[error("stock of {product_id} would become negative ({balance})")]
    NegativeBalance { product_id: ProductId, balance: i64 },

    #[error("stock of {product_id} would overflow")]
    Overflow { product_id: ProductId },
}

#[derive(Debug, Default)]
struct ProjectionState {
    balances: HashMap<ProductId, i64>,
    /// Last revision applied per product.
    cursors: HashMap<ProductId, u64>,
    /// Revision the projection was last rebuilt at; anything at or below it is
    /// already folded into `balances`.
    baseline: u64,
}

/// Running stock balance per product.
///
/// Updated by the engine inside the per-product critical section of every ledger
/// mutation, so reads are O(1) and never stale. Disjoint-product writes can reach the
/// projection out of revision order, hence the cursor is kept per product rather
/// than globally.
#[derive(Debug, Default)]
pub struct StockProjection {
    state: RwLock<ProjectionState>,
}

impl StockProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance of a product (0 if never seen).
    pub fn balance(&self, product_id: ProductId) -> Result<i64, StockProjectionError> {
        let state = self.state.read().map_err(|_| StockProjectionError::Poisoned)?;
        Ok(state.balances.get(&product_id).copied().unwrap_or(0))
    }

    /// Products with a balance entry, sorted.
    pub fn known_products(&self) -> Result<Vec<ProductId>, StockProjectionError> {
        let state = self.state.read().map_err(|_| StockProjectionError::Poisoned)?;
        let mut ids: Vec<_> = state.balances.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    /// Replace the read model with the balances derived from `entries`, read at ledger
    /// position `revision`.
    ///
    /// Balances are aggregated, not replayed one by one: a replay of the surviving
    /// entries may pass through negative intermediate balances that never existed.
    pub fn rebuild_from_scratch<'a>(
        &self,
        entries: impl IntoIterator<Item = &'a LedgerEntry>,
        revision: u64,
    ) -> Result<(), StockProjectionError> {
        let balances = balances_from_entries(entries);
        let mut state = self.state.write().map_err(|_| StockProjectionError::Poisoned)?;
        *state = ProjectionState {
            balances,
            cursors: HashMap::new(),
            baseline: revision,
        };
        Ok(())
    }
}

impl Projection for StockProjection {
    type Ev = LedgerEvent;
    type Error = StockProjectionError;

    /// Apply one ledger change. All-or-nothing: if any touched product would go
    /// negative or past `i64::MAX`, nothing is applied.
    fn apply(&self, envelope: &EventEnvelope<LedgerEvent>) -> Result<(), StockProjectionError> {
        let revision = envelope.revision();
        let mut state = self.state.write().map_err(|_| StockProjectionError::Poisoned)?;

        // Sum per product first; an entry may list the same product twice.
        let mut deltas: Vec<(ProductId, i64)> = Vec::new();
        for (product_id, delta) in envelope.payload().stock_deltas() {
            match deltas.iter_mut().find(|(p, _)| *p == product_id) {
                Some((_, d)) => *d = d.checked_add(delta).ok_or(StockProjectionError::Overflow { product_id })?,
                None => deltas.push((product_id, delta)),
            }
        }

        let mut updates = Vec::with_capacity(deltas.len());
        for (product_id, delta) in deltas {
            let cursor = state.cursors.get(&product_id).copied().unwrap_or(0);
            if revision <= state.baseline.max(cursor) {
                // Already applied.
                continue;
            }
            let balance = state
                .balances
                .get(&product_id)
                .copied()
                .unwrap_or(0)
                .checked_add(delta)
                .ok_or(StockProjectionError::Overflow { product_id })?;
            if balance < 0 {
                return Err(StockProjectionError::NegativeBalance { product_id, balance });
            }
            updates.push((product_id, balance));
        }

        for (product_id, balance) in updates {
            state.balances.insert(product_id, balance);
            state.cursors.insert(product_id, revision);
        }

        Ok(())
    }
}

impl StockAggregator for StockProjection {
    type Error = StockProjectionError;

    fn balance_of(&self, product_id: ProductId) -> Result<i64, Self::Error> {
        self.balance(product_id)
    }

    fn balances_for_all(&self, product_ids: &[ProductId]) -> Result<HashMap<ProductId, i64>, Self::Error> {
        let state = self.state.read().map_err(|_| StockProjectionError::Poisoned)?;
        Ok(product_ids
            .iter()
            .map(|id| (*id, state.balances.get(id).copied().unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockledger_core::EntryId;
    use stockledger_inventory::{Direction, LedgerLine, Quantity};
    use uuid::Uuid;

    fn entry(direction: Direction, lines: &[(ProductId, u64)]) -> LedgerEntry {
        LedgerEntry::new(
            EntryId::new(),
            direction,
            lines
                .iter()
                .map(|(p, q)| LedgerLine {
                    product_id: *p,
                    quantity: Quantity::new(*q).unwrap(),
                    product_name: "Widget".to_string(),
                    unit_price: 1,
                })
                .collect(),
            Utc::now(),
        )
        .unwrap()
    }

    fn recorded(entry: &LedgerEntry, revision: u64) -> EventEnvelope<LedgerEvent> {
        EventEnvelope::new(Uuid::now_v7(), entry.id_typed(), revision, LedgerEvent::recorded(entry))
    }

    fn removed(entry: &LedgerEntry, revision: u64) -> EventEnvelope<LedgerEvent> {
        EventEnvelope::new(
            Uuid::now_v7(),
            entry.id_typed(),
            revision,
            LedgerEvent::removed(entry, Utc::now()),
        )
    }

    #[test]
    fn tracks_balance_from_events() {
        let proj = StockProjection::new();
        let p = ProductId::new();

        let inbound = entry(Direction::Inbound, &[(p, 50)]);
        let outbound = entry(Direction::Outbound, &[(p, 30)]);
        proj.apply(&recorded(&inbound, 1)).unwrap();
        proj.apply(&recorded(&outbound, 2)).unwrap();
        assert_eq!(proj.balance(p).unwrap(), 20);

        proj.apply(&removed(&outbound, 3)).unwrap();
        assert_eq!(proj.balance(p).unwrap(), 50);
    }

    #[test]
    fn replayed_revision_is_ignored() {
        let proj = StockProjection::new();
        let p = ProductId::new();
        let e = entry(Direction::Inbound, &[(p, 5)]);

        let env = recorded(&e, 1);
        proj.apply(&env).unwrap();
        proj.apply(&env).unwrap();

        assert_eq!(proj.balance(p).unwrap(), 5);
    }

    #[test]
    fn disjoint_products_tolerate_out_of_order_revisions() {
        let proj = StockProjection::new();
        let a = ProductId::new();
        let b = ProductId::new();

        proj.apply(&recorded(&entry(Direction::Inbound, &[(b, 2)]), 6)).unwrap();
        proj.apply(&recorded(&entry(Direction::Inbound, &[(a, 3)]), 5)).unwrap();

        assert_eq!(proj.balance(a).unwrap(), 3);
        assert_eq!(proj.balance(b).unwrap(), 2);
    }

    #[test]
    fn negative_result_rejects_whole_event() {
        let proj = StockProjection::new();
        let a = ProductId::new();
        let b = ProductId::new();
        proj.apply(&recorded(&entry(Direction::Inbound, &[(a, 10), (b, 1)]), 1)).unwrap();

        let err = proj
            .apply(&recorded(&entry(Direction::Outbound, &[(a, 4), (b, 2)]), 2))
            .unwrap_err();
        assert_eq!(err, StockProjectionError::NegativeBalance { product_id: b, balance: -1 });
        assert_eq!(proj.balance(a).unwrap(), 10);
        assert_eq!(proj.balance(b).unwrap(), 1);
    }

    #[test]
    fn overflow_rejects_whole_event() {
        let proj = StockProjection::new();
        let a = ProductId::new();
        let b = ProductId::new();
        let max = i64::MAX as u64;
        proj.apply(&recorded(&entry(Direction::Inbound, &[(a, max)]), 1)).unwrap();

        let err = proj
            .apply(&recorded(&entry(Direction::Inbound, &[(b, 3), (a, 1)]), 2))
            .unwrap_err();
        assert_eq!(err, StockProjectionError::Overflow { product_id: a });
        assert_eq!(proj.balance(a).unwrap(), i64::MAX);
        assert_eq!(proj.balance(b).unwrap(), 0);

        // Lines of one event that only overflow once summed.
        let err = proj
            .apply(&recorded(&entry(Direction::Inbound, &[(b, max), (b, max)]), 3))
            .unwrap_err();
        assert_eq!(err, StockProjectionError::Overflow { product_id: b });

        // The lock is still usable after a rejection.
        proj.apply(&recorded(&entry(Direction::Outbound, &[(a, 1)]), 4)).unwrap();
        assert_eq!(proj.balance(a).unwrap(), i64::MAX - 1);
    }

    #[test]
    fn rebuild_sets_baseline() {
        let proj = StockProjection::new();
        let p = ProductId::new();
        let e = entry(Direction::Inbound, &[(p, 7), (p, 3)]);

        proj.rebuild_from_scratch([&e], 4).unwrap();
        assert_eq!(proj.balance(p).unwrap(), 10);
        assert_eq!(proj.known_products().unwrap(), vec![p]);

        // Already folded in by the rebuild.
        proj.apply(&recorded(&e, 4)).unwrap();
        assert_eq!(proj.balance(p).unwrap(), 10);

        proj.apply(&recorded(&entry(Direction::Outbound, &[(p, 1)]), 5)).unwrap();
        assert_eq!(proj.balance_of(p).unwrap(), 9);
        assert_eq!(proj.balances_for_all(&[p]).unwrap()[&p], 9);
    }
}
