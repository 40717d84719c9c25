//! Ledger command engine.
//!
//! `StockLedger` composes the injected ledger store and product catalog with the stock
//! projection, the per-product locks and the receipt sequence.
//!
//! ## Write path
//!
//! ```text
//! lines
//!   ↓
//! 1. Shape checks + catalog lookup (unknown product rejects the batch)
//!   ↓
//! 2. Lock the set of touched products
//!   ↓
//! 3. Validate against the projected balances (outbound / inbound removal)
//!   ↓
//! 4. Append (or remove) in the store
//!   ↓
//! 5. Apply the change to the projection; undo step 4 if that fails
//! ```
//!
//! Steps 3 to 5 run under the product locks, so two writers touching the same product
//! never validate against the same balance. Writers on disjoint products run in
//! parallel.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use stockledger_core::{DomainError, EntryId, ProductId};
use stockledger_events::{Event, EventEnvelope, Projection};
use stockledger_inventory::{
    Direction, LedgerEntry, LedgerEvent, LedgerLine, MovementLine, Receipt, ReceiptCode, StockLevel,
    balances_from_entries, requested_by_product, validate_inbound, validate_lines, validate_outbound, validate_removal,
};
use stockledger_products::ProductCatalog;

use crate::aggregator::StockAggregator;
use crate::config::LedgerConfig;
use crate::ledger_store::{LedgerSnapshot, LedgerStore, LedgerStoreError};
use crate::locks::{LockPoisoned, ProductLocks};
use crate::projections::{StockProjection, StockProjectionError};
use crate::receipts::ReceiptSequence;

#[derive(Debug, Error)]
pub enum LedgerCommandError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("ledger store failure: {0}")]
    Store(LedgerStoreError),

    #[error("stock projection failure: {0}")]
    Projection(#[from] StockProjectionError),

    #[error(transparent)]
    Lock(#[from] LockPoisoned),
}

impl From<LedgerStoreError> for LedgerCommandError {
    fn from(value: LedgerStoreError) -> Self {
        match value {
            LedgerStoreError::NotFound(_) => LedgerCommandError::Domain(DomainError::NotFound),
            LedgerStoreError::DuplicateCode(code) => LedgerCommandError::Domain(DomainError::conflict(format!(
                "receipt code {code} is already in use"
            ))),
            other => LedgerCommandError::Store(other),
        }
    }
}

/// A product whose cached balance disagrees with the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDrift {
    pub product_id: ProductId,
    pub projected: i64,
    pub derived: i64,
}

pub struct StockLedger<S, C> {
    store: S,
    catalog: C,
    projection: StockProjection,
    locks: ProductLocks,
    codes: ReceiptSequence,
}

impl<S, C> StockLedger<S, C>
where
    S: LedgerStore,
    C: ProductCatalog,
{
    /// Wire the engine over existing storage: the projection is rebuilt from the
    /// ledger and the receipt counters continue after the highest stored code.
    pub fn new(store: S, catalog: C, config: &LedgerConfig) -> Result<Self, LedgerCommandError> {
        let projection = StockProjection::new();
        let snapshot = store.snapshot()?;
        projection.rebuild_from_scratch(&snapshot.entries, snapshot.revision)?;

        let codes = ReceiptSequence::from_config(config);
        codes.resume_from(&store)?;

        debug!(
            entries = snapshot.entries.len(),
            revision = snapshot.revision,
            "stock ledger initialised"
        );

        Ok(Self {
            store,
            catalog,
            projection,
            locks: ProductLocks::new(),
            codes,
        })
    }

    pub fn record_inbound(&self, lines: &[MovementLine]) -> Result<Receipt, LedgerCommandError> {
        self.create_receipt(Direction::Inbound, lines)
    }

    pub fn record_outbound(&self, lines: &[MovementLine]) -> Result<Receipt, LedgerCommandError> {
        self.create_receipt(Direction::Outbound, lines)
    }

    /// Record a coded batch of movements as one ledger entry.
    ///
    /// All-or-nothing: on any failure nothing stays in the ledger and balances are
    /// unchanged.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub fn create_receipt(&self, direction: Direction, lines: &[MovementLine]) -> Result<Receipt, LedgerCommandError> {
        validate_lines(lines)?;
        let product_ids: Vec<ProductId> = requested_by_product(lines)?.into_iter().map(|(p, _)| p).collect();

        let ledger_lines = lines
            .iter()
            .map(|line| {
                let product = self
                    .catalog
                    .product(line.product_id)
                    .ok_or(DomainError::UnknownProduct(line.product_id))?;
                LedgerLine::snapshot(line, &product)
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        let entry = LedgerEntry::new(EntryId::new(), direction, ledger_lines, Utc::now())?;

        let _guard = self.locks.acquire(&product_ids)?;

        let balances = self.projection.balances_for_all(&product_ids)?;
        let available = |p: ProductId| balances.get(&p).copied().unwrap_or(0);
        match direction {
            Direction::Inbound => validate_inbound(lines, available)?,
            Direction::Outbound => validate_outbound(lines, available)?,
        }

        let committed = self.append_coded(entry)?;

        if let Err(e) = self.project(LedgerEvent::recorded(&committed), committed.revision()) {
            warn!(entry_id = %committed.id_typed(), error = %e, "projection rejected entry, removing it");
            match self.store.remove(committed.id_typed()) {
                Ok(_) => {
                    if let Some(code) = committed.code() {
                        self.codes.release(direction, code);
                    }
                }
                Err(undo) => {
                    error!(entry_id = %committed.id_typed(), error = %undo, "failed to remove unprojected entry");
                }
            }
            return Err(e.into());
        }

        let receipt = Receipt::from_entry(&committed)?;
        debug!(
            entry_id = %committed.id_typed(),
            code = %receipt.code,
            revision = committed.revision(),
            "receipt recorded"
        );
        Ok(receipt)
    }

    /// Delete an entry and reverse its effect on stock.
    ///
    /// `NotFound` when no entry with this id exists in the `direction` ledger.
    #[instrument(skip(self))]
    pub fn remove_entry(&self, entry_id: EntryId, direction: Direction) -> Result<LedgerEntry, LedgerCommandError> {
        let product_ids = self.entry_in(entry_id, direction)?.product_ids();
        let _guard = self.locks.acquire(&product_ids)?;

        // Re-read under the lock: a concurrent removal may have won.
        let entry = self.entry_in(entry_id, direction)?;
        let balances = self.projection.balances_for_all(&product_ids)?;
        validate_removal(&entry, |p| balances.get(&p).copied().unwrap_or(0))?;

        let removed = self.store.remove(entry_id)?;
        if let Err(e) = self.project(LedgerEvent::removed(&removed.entry, Utc::now()), removed.revision) {
            warn!(error = %e, "projection rejected removal, restoring entry");
            if let Err(undo) = self.store.append(entry) {
                error!(error = %undo, "failed to restore removed entry");
            }
            return Err(e.into());
        }

        debug!(revision = removed.revision, "entry removed");
        Ok(removed.entry)
    }

    /// Current balance of one product (0 when it never moved).
    pub fn stock_of(&self, product_id: ProductId) -> Result<i64, LedgerCommandError> {
        Ok(self.projection.balance(product_id)?)
    }

    /// Balances of every catalog product.
    pub fn stock_for_all(&self) -> Result<HashMap<ProductId, i64>, LedgerCommandError> {
        let ids: Vec<ProductId> = self.catalog.products().iter().map(|p| p.id_typed()).collect();
        Ok(self.projection.balances_for_all(&ids)?)
    }

    /// Catalog products with their names and balances, in catalog order.
    pub fn stock_levels(&self) -> Result<Vec<StockLevel>, LedgerCommandError> {
        let products = self.catalog.products();
        let ids: Vec<ProductId> = products.iter().map(|p| p.id_typed()).collect();
        let balances = self.projection.balances_for_all(&ids)?;

        Ok(products
            .into_iter()
            .map(|p| StockLevel {
                product_id: p.id_typed(),
                stock: balances.get(&p.id_typed()).copied().unwrap_or(0),
                name: p.name().to_string(),
            })
            .collect())
    }

    pub fn entry(&self, entry_id: EntryId) -> Result<LedgerEntry, LedgerCommandError> {
        self.store
            .find(entry_id)?
            .ok_or(LedgerCommandError::Domain(DomainError::NotFound))
    }

    /// Entries of one direction, oldest first.
    pub fn entries(&self, direction: Direction) -> Result<Vec<LedgerEntry>, LedgerCommandError> {
        Ok(self.store.list(direction)?)
    }

    /// Valued receipts of one direction, oldest first. Uncoded entries are skipped.
    pub fn receipts(&self, direction: Direction) -> Result<Vec<Receipt>, LedgerCommandError> {
        self.store
            .list(direction)?
            .iter()
            .filter(|e| e.code().is_some())
            .map(|e| Receipt::from_entry(e).map_err(LedgerCommandError::from))
            .collect()
    }

    /// Look a receipt up by code in either ledger.
    pub fn receipt_by_code(&self, code: &str) -> Result<Receipt, LedgerCommandError> {
        let code = ReceiptCode::new(code.trim())?;

        for direction in [Direction::Outbound, Direction::Inbound] {
            if let Some(entry) = self.store.find_by_code(direction, &code)? {
                return Ok(Receipt::from_entry(&entry)?);
            }
        }
        Err(DomainError::NotFound.into())
    }

    /// Compare the projection with balances derived from the ledger, for every product
    /// either of them knows. An empty result means they agree.
    #[instrument(skip(self))]
    pub fn verify_consistency(&self) -> Result<Vec<StockDrift>, LedgerCommandError> {
        let _guard = self.locks.acquire_all()?;
        let snapshot = self.store.snapshot()?;
        self.drifts(&snapshot)
    }

    /// Rebuild the projection from the ledger. Returns the drifts that were repaired.
    #[instrument(skip(self))]
    pub fn reconcile(&self) -> Result<Vec<StockDrift>, LedgerCommandError> {
        let _guard = self.locks.acquire_all()?;
        let snapshot = self.store.snapshot()?;
        let drifts = self.drifts(&snapshot)?;

        self.projection
            .rebuild_from_scratch(&snapshot.entries, snapshot.revision)?;

        if !drifts.is_empty() {
            warn!(drifts = drifts.len(), "stock projection repaired");
        }
        Ok(drifts)
    }

    fn drifts(&self, snapshot: &LedgerSnapshot) -> Result<Vec<StockDrift>, LedgerCommandError> {
        let derived = balances_from_entries(&snapshot.entries);

        let mut ids: Vec<ProductId> = derived.keys().copied().collect();
        ids.extend(self.projection.known_products()?);
        ids.sort();
        ids.dedup();

        let projected = self.projection.balances_for_all(&ids)?;
        Ok(ids
            .into_iter()
            .filter_map(|product_id| {
                let projected = projected.get(&product_id).copied().unwrap_or(0);
                let derived = derived.get(&product_id).copied().unwrap_or(0);
                (projected != derived).then_some(StockDrift {
                    product_id,
                    projected,
                    derived,
                })
            })
            .collect())
    }

    fn entry_in(&self, entry_id: EntryId, direction: Direction) -> Result<LedgerEntry, LedgerCommandError> {
        self.store
            .find(entry_id)?
            .filter(|e| e.direction() == direction)
            .ok_or(LedgerCommandError::Domain(DomainError::NotFound))
    }

    /// Append `entry` under a fresh receipt code.
    ///
    /// A code collision means the counter fell behind the store (e.g. a concurrent
    /// writer on another process); the counter is resumed and the append retried once.
    fn append_coded(&self, entry: LedgerEntry) -> Result<LedgerEntry, LedgerCommandError> {
        let direction = entry.direction();
        let mut retried = false;

        loop {
            let code = self.codes.next_code(direction);
            match self.store.append(entry.clone().with_code(code.clone())) {
                Ok(committed) => return Ok(committed),
                Err(LedgerStoreError::DuplicateCode(_)) if !retried => {
                    warn!(%code, "receipt code already used, retrying with a fresh one");
                    self.codes.resume_from(&self.store)?;
                    retried = true;
                }
                Err(e) => {
                    if !matches!(e, LedgerStoreError::DuplicateCode(_)) {
                        self.codes.release(direction, &code);
                    }
                    return Err(e.into());
                }
            }
        }
    }

    fn project(&self, event: LedgerEvent, revision: u64) -> Result<(), StockProjectionError> {
        let envelope = EventEnvelope::new(Uuid::now_v7(), event.entry_id(), revision, event);
        let payload = envelope.payload();
        debug!(
            event_id = %envelope.event_id(),
            event = payload.event_type(),
            version = payload.version(),
            occurred_at = %payload.occurred_at(),
            revision,
            "applying ledger change"
        );
        self.projection.apply(&envelope)
    }
}

impl<S, C> core::fmt::Debug for StockLedger<S, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StockLedger")
            .field("projection", &self.projection)
            .field("codes", &self.codes)
            .finish_non_exhaustive()
    }
}
