use std::sync::Arc;

use thiserror::Error;

use stockledger_core::{EntryId, ProductId};
use stockledger_inventory::{Direction, LedgerEntry, ReceiptCode, ReceiptCodeFormat};

/// Ledger store operation error.
///
/// These are **infrastructure errors** (storage, uniqueness, availability) as opposed
/// to domain errors (validation, stock invariants). The engine folds the ones with a
/// domain meaning (`NotFound`, `DuplicateCode`) into `DomainError`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerStoreError {
    #[error("ledger entry not found: {0}")]
    NotFound(EntryId),

    #[error("receipt code already used: {0}")]
    DuplicateCode(ReceiptCode),

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("ledger store unavailable: {0}")]
    Unavailable(String),
}

/// An entry deleted from the ledger, with the ledger position of the deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedEntry {
    pub entry: LedgerEntry,
    pub revision: u64,
}

/// Every entry currently in the ledger, read at one ledger position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub entries: Vec<LedgerEntry>,
    pub revision: u64,
}

/// Append-only ledger of stock movements.
///
/// ## Revisions
///
/// Every mutation (append or remove) advances the ledger `revision` by one. The
/// appended entry is returned stamped with its revision; a removal reports the
/// revision it happened at. Projections use revisions to stay idempotent.
///
/// ## Ordering
///
/// Listings are ascending by creation time, ties broken by revision, so the order is
/// stable across calls.
///
/// ## Implementation Requirements
///
/// Implementations must:
/// - persist an entry atomically (all of its lines or none)
/// - reject entries without lines and duplicate entry ids (`InvalidAppend`)
/// - keep receipt codes unique per direction (`DuplicateCode`)
/// - remember the codes of removed entries in `highest_code_number`, so a restart
///   never reissues them
/// - never check stock or the catalog; that is the engine's job
pub trait LedgerStore: Send + Sync {
    /// Persist a new entry and return it stamped with its revision.
    fn append(&self, entry: LedgerEntry) -> Result<LedgerEntry, LedgerStoreError>;

    /// Delete an entry.
    fn remove(&self, entry_id: EntryId) -> Result<RemovedEntry, LedgerStoreError>;

    fn find(&self, entry_id: EntryId) -> Result<Option<LedgerEntry>, LedgerStoreError>;

    fn find_by_code(
        &self,
        direction: Direction,
        code: &ReceiptCode,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError>;

    /// Entries with at least one line for `product_id`.
    fn list_by_product(&self, product_id: ProductId) -> Result<Vec<LedgerEntry>, LedgerStoreError>;

    /// Entries of one direction.
    fn list(&self, direction: Direction) -> Result<Vec<LedgerEntry>, LedgerStoreError>;

    /// All entries plus the revision they were read at.
    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerStoreError>;

    /// Current ledger position (0 for an untouched ledger).
    fn revision(&self) -> Result<u64, LedgerStoreError>;

    fn list_all(&self) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        Ok(self.snapshot()?.entries)
    }

    /// Highest counter value among codes of `direction` written in `format`, removed
    /// entries included. Codes in any other format are ignored.
    ///
    /// The default only sees live entries; stores that can remember removed codes
    /// override it.
    fn highest_code_number(
        &self,
        direction: Direction,
        format: &ReceiptCodeFormat,
    ) -> Result<u64, LedgerStoreError> {
        Ok(self
            .list(direction)?
            .iter()
            .filter_map(|e| e.code().and_then(|c| format.parse(c)))
            .max()
            .unwrap_or(0))
    }
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn append(&self, entry: LedgerEntry) -> Result<LedgerEntry, LedgerStoreError> {
        (**self).append(entry)
    }

    fn remove(&self, entry_id: EntryId) -> Result<RemovedEntry, LedgerStoreError> {
        (**self).remove(entry_id)
    }

    fn find(&self, entry_id: EntryId) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        (**self).find(entry_id)
    }

    fn find_by_code(
        &self,
        direction: Direction,
        code: &ReceiptCode,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        (**self).find_by_code(direction, code)
    }

    fn list_by_product(&self, product_id: ProductId) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        (**self).list_by_product(product_id)
    }

    fn list(&self, direction: Direction) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        (**self).list(direction)
    }

    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerStoreError> {
        (**self).snapshot()
    }

    fn revision(&self) -> Result<u64, LedgerStoreError> {
        (**self).revision()
    }

    fn list_all(&self) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        (**self).list_all()
    }

    fn highest_code_number(
        &self,
        direction: Direction,
        format: &ReceiptCodeFormat,
    ) -> Result<u64, LedgerStoreError> {
        (**self).highest_code_number(direction, format)
    }
}
