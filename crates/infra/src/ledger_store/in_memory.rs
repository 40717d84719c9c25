use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use stockledger_core::{EntryId, ProductId};
use stockledger_inventory::{Direction, LedgerEntry, ReceiptCode, ReceiptCodeFormat};

use super::r#trait::{LedgerSnapshot, LedgerStore, LedgerStoreError, RemovedEntry};

#[derive(Debug, Default)]
struct LedgerState {
    /// Entries keyed by the revision they were appended at.
    entries: BTreeMap<u64, LedgerEntry>,
    by_id: HashMap<EntryId, u64>,
    by_code: HashMap<(Direction, ReceiptCode), u64>,
    by_product: HashMap<ProductId, BTreeSet<u64>>,
    /// Codes of removed entries, kept so the sequence never goes back over them.
    retired_codes: Vec<(Direction, ReceiptCode)>,
    revision: u64,
}

impl LedgerState {
    fn sorted<'a>(entries: impl Iterator<Item = &'a LedgerEntry>) -> Vec<LedgerEntry> {
        let mut out: Vec<LedgerEntry> = entries.cloned().collect();
        out.sort_by_key(|e| (e.created_at(), e.revision()));
        out
    }
}

/// In-memory append-only ledger store.
///
/// Intended for tests/dev and the default API wiring. The internal lock only guards
/// the maps; stock validation is serialized by the engine's per-product locks.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<LedgerState>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> LedgerStoreError {
        LedgerStoreError::Unavailable("lock poisoned".to_string())
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn append(&self, entry: LedgerEntry) -> Result<LedgerEntry, LedgerStoreError> {
        if entry.lines().is_empty() {
            return Err(LedgerStoreError::InvalidAppend("entry has no lines".to_string()));
        }

        let mut state = self.state.write().map_err(|_| Self::poisoned())?;

        if state.by_id.contains_key(&entry.id_typed()) {
            return Err(LedgerStoreError::InvalidAppend(format!(
                "entry {} already exists",
                entry.id_typed()
            )));
        }
        if let Some(code) = entry.code() {
            if state.by_code.contains_key(&(entry.direction(), code.clone())) {
                return Err(LedgerStoreError::DuplicateCode(code.clone()));
            }
        }

        let revision = state.revision + 1;
        let committed = entry.committed_at(revision);

        state.revision = revision;
        state.by_id.insert(committed.id_typed(), revision);
        if let Some(code) = committed.code() {
            state.by_code.insert((committed.direction(), code.clone()), revision);
        }
        for product_id in committed.product_ids() {
            state.by_product.entry(product_id).or_default().insert(revision);
        }
        state.entries.insert(revision, committed.clone());

        Ok(committed)
    }

    fn remove(&self, entry_id: EntryId) -> Result<RemovedEntry, LedgerStoreError> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;

        let appended_at = state
            .by_id
            .remove(&entry_id)
            .ok_or(LedgerStoreError::NotFound(entry_id))?;
        let entry = state
            .entries
            .remove(&appended_at)
            .ok_or_else(|| LedgerStoreError::Unavailable(format!("index out of sync for {entry_id}")))?;

        if let Some(code) = entry.code() {
            let key = (entry.direction(), code.clone());
            state.by_code.remove(&key);
            state.retired_codes.push(key);
        }
        for product_id in entry.product_ids() {
            if let Some(revs) = state.by_product.get_mut(&product_id) {
                revs.remove(&appended_at);
                if revs.is_empty() {
                    state.by_product.remove(&product_id);
                }
            }
        }

        state.revision += 1;
        Ok(RemovedEntry {
            entry,
            revision: state.revision,
        })
    }

    fn find(&self, entry_id: EntryId) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state
            .by_id
            .get(&entry_id)
            .and_then(|rev| state.entries.get(rev))
            .cloned())
    }

    fn find_by_code(
        &self,
        direction: Direction,
        code: &ReceiptCode,
    ) -> Result<Option<LedgerEntry>, LedgerStoreError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state
            .by_code
            .get(&(direction, code.clone()))
            .and_then(|rev| state.entries.get(rev))
            .cloned())
    }

    fn list_by_product(&self, product_id: ProductId) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        let Some(revs) = state.by_product.get(&product_id) else {
            return Ok(vec![]);
        };
        Ok(LedgerState::sorted(
            revs.iter().filter_map(|rev| state.entries.get(rev)),
        ))
    }

    fn list(&self, direction: Direction) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(LedgerState::sorted(
            state.entries.values().filter(|e| e.direction() == direction),
        ))
    }

    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerStoreError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(LedgerSnapshot {
            entries: LedgerState::sorted(state.entries.values()),
            revision: state.revision,
        })
    }

    fn revision(&self) -> Result<u64, LedgerStoreError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state.revision)
    }

    fn highest_code_number(
        &self,
        direction: Direction,
        format: &ReceiptCodeFormat,
    ) -> Result<u64, LedgerStoreError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state
            .by_code
            .keys()
            .chain(state.retired_codes.iter())
            .filter(|(d, _)| *d == direction)
            .filter_map(|(_, code)| format.parse(code))
            .max()
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use stockledger_inventory::{LedgerLine, Quantity, ReceiptCodeFormat};

    fn line(product_id: ProductId, qty: u64) -> LedgerLine {
        LedgerLine {
            product_id,
            quantity: Quantity::new(qty).unwrap(),
            product_name: "Widget".to_string(),
            unit_price: 10,
        }
    }

    fn entry(direction: Direction, lines: Vec<LedgerLine>) -> LedgerEntry {
        LedgerEntry::new(EntryId::new(), direction, lines, Utc::now()).unwrap()
    }

    #[test]
    fn append_assigns_increasing_revisions() {
        let store = InMemoryLedgerStore::new();
        let p = ProductId::new();

        let a = store.append(entry(Direction::Inbound, vec![line(p, 5)])).unwrap();
        let b = store.append(entry(Direction::Outbound, vec![line(p, 2)])).unwrap();

        assert_eq!(a.revision(), 1);
        assert_eq!(b.revision(), 2);
        assert_eq!(store.revision().unwrap(), 2);
        assert_eq!(store.find(a.id_typed()).unwrap(), Some(a));
    }

    #[test]
    fn duplicate_entry_id_is_rejected() {
        let store = InMemoryLedgerStore::new();
        let e = entry(Direction::Inbound, vec![line(ProductId::new(), 1)]);
        store.append(e.clone()).unwrap();

        let err = store.append(e).unwrap_err();
        assert!(matches!(err, LedgerStoreError::InvalidAppend(_)));
        assert_eq!(store.revision().unwrap(), 1);
    }

    #[test]
    fn codes_are_unique_per_direction() {
        let store = InMemoryLedgerStore::new();
        let p = ProductId::new();
        let code = ReceiptCode::new("R0001").unwrap();

        store
            .append(entry(Direction::Inbound, vec![line(p, 1)]).with_code(code.clone()))
            .unwrap();
        // Same code in the other direction is fine.
        store
            .append(entry(Direction::Outbound, vec![line(p, 1)]).with_code(code.clone()))
            .unwrap();

        let err = store
            .append(entry(Direction::Inbound, vec![line(p, 1)]).with_code(code.clone()))
            .unwrap_err();
        assert_eq!(err, LedgerStoreError::DuplicateCode(code.clone()));

        let found = store.find_by_code(Direction::Inbound, &code).unwrap().unwrap();
        assert_eq!(found.direction(), Direction::Inbound);
    }

    #[test]
    fn remove_frees_indices_and_advances_revision() {
        let store = InMemoryLedgerStore::new();
        let p = ProductId::new();
        let code = ReceiptCode::new("PN0001").unwrap();
        let e = store
            .append(entry(Direction::Inbound, vec![line(p, 3)]).with_code(code.clone()))
            .unwrap();

        let removed = store.remove(e.id_typed()).unwrap();
        assert_eq!(removed.entry.id_typed(), e.id_typed());
        assert_eq!(removed.revision, 2);

        assert_eq!(store.find(e.id_typed()).unwrap(), None);
        assert_eq!(store.find_by_code(Direction::Inbound, &code).unwrap(), None);
        assert!(store.list_by_product(p).unwrap().is_empty());

        let err = store.remove(e.id_typed()).unwrap_err();
        assert_eq!(err, LedgerStoreError::NotFound(e.id_typed()));
    }

    #[test]
    fn list_by_product_is_ascending_by_creation() {
        let store = InMemoryLedgerStore::new();
        let p = ProductId::new();
        let other = ProductId::new();
        let now = Utc::now();

        let later = LedgerEntry::new(EntryId::new(), Direction::Inbound, vec![line(p, 1)], now).unwrap();
        let earlier = LedgerEntry::new(
            EntryId::new(),
            Direction::Outbound,
            vec![line(other, 1), line(p, 1)],
            now - Duration::seconds(5),
        )
        .unwrap();
        let unrelated = LedgerEntry::new(EntryId::new(), Direction::Inbound, vec![line(other, 1)], now).unwrap();

        store.append(later.clone()).unwrap();
        store.append(earlier.clone()).unwrap();
        store.append(unrelated).unwrap();

        let ids: Vec<_> = store
            .list_by_product(p)
            .unwrap()
            .iter()
            .map(|e| e.id_typed())
            .collect();
        assert_eq!(ids, vec![earlier.id_typed(), later.id_typed()]);
        assert_eq!(store.list(Direction::Inbound).unwrap().len(), 2);
        assert_eq!(store.snapshot().unwrap().entries.len(), 3);
    }

    #[test]
    fn highest_code_number_ignores_foreign_formats() {
        let store = InMemoryLedgerStore::new();
        let p = ProductId::new();
        let format = ReceiptCodeFormat::default_for(Direction::Inbound);

        assert_eq!(store.highest_code_number(Direction::Inbound, &format).unwrap(), 0);

        for code in ["PN0002", "PN0007", "LEGACY-9", "PN12x"] {
            store
                .append(entry(Direction::Inbound, vec![line(p, 1)]).with_code(ReceiptCode::new(code).unwrap()))
                .unwrap();
        }
        store
            .append(entry(Direction::Outbound, vec![line(p, 1)]).with_code(ReceiptCode::new("PN0042").unwrap()))
            .unwrap();

        assert_eq!(store.highest_code_number(Direction::Inbound, &format).unwrap(), 7);
    }

    #[test]
    fn highest_code_number_remembers_removed_entries() {
        let store = InMemoryLedgerStore::new();
        let p = ProductId::new();
        let format = ReceiptCodeFormat::default_for(Direction::Inbound);
        let code = ReceiptCode::new("PN0005").unwrap();

        let e = store
            .append(entry(Direction::Inbound, vec![line(p, 1)]).with_code(code.clone()))
            .unwrap();
        store.remove(e.id_typed()).unwrap();
        assert_eq!(store.highest_code_number(Direction::Inbound, &format).unwrap(), 5);

        // The code itself is free again for a restored entry.
        store.append(e.clone()).unwrap();
        assert_eq!(store.find_by_code(Direction::Inbound, &code).unwrap().map(|f| f.id_typed()), Some(e.id_typed()));
    }
}
