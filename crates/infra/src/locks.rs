//! Per-product mutual exclusion for ledger writes.
//!
//! A command locks the whole *set* of products it touches at once. Acquisition is
//! all-or-nothing under one mutex, so two commands can never hold parts of each
//! other's sets and wait forever.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard};

use thiserror::Error;

use stockledger_core::ProductId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("product lock table poisoned")]
pub struct LockPoisoned;

#[derive(Debug, Default)]
struct LockTable {
    held: HashSet<ProductId>,
    /// Set while one holder owns every product (rebuilds, verification).
    exclusive: bool,
    /// Number of product-set guards alive.
    active: usize,
}

#[derive(Debug, Default)]
pub struct ProductLocks {
    table: Mutex<LockTable>,
    released: Condvar,
}

impl ProductLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until every product in `product_ids` is free, then hold them all.
    pub fn acquire(&self, product_ids: &[ProductId]) -> Result<ProductLockGuard<'_>, LockPoisoned> {
        let mut ids: Vec<ProductId> = product_ids.to_vec();
        ids.sort();
        ids.dedup();

        let mut table = self.lock_table()?;
        while table.exclusive || ids.iter().any(|id| table.held.contains(id)) {
            table = self.released.wait(table).map_err(|_| LockPoisoned)?;
        }
        table.held.extend(ids.iter().copied());
        table.active += 1;

        Ok(ProductLockGuard {
            locks: self,
            scope: Scope::Products(ids),
        })
    }

    /// Block until no product is held, then hold the whole ledger.
    pub fn acquire_all(&self) -> Result<ProductLockGuard<'_>, LockPoisoned> {
        let mut table = self.lock_table()?;
        // Claim first so new product-set writers queue behind us.
        while table.exclusive {
            table = self.released.wait(table).map_err(|_| LockPoisoned)?;
        }
        table.exclusive = true;
        while table.active > 0 {
            table = self.released.wait(table).map_err(|_| LockPoisoned)?;
        }

        Ok(ProductLockGuard {
            locks: self,
            scope: Scope::All,
        })
    }

    fn lock_table(&self) -> Result<MutexGuard<'_, LockTable>, LockPoisoned> {
        self.table.lock().map_err(|_| LockPoisoned)
    }
}

#[derive(Debug)]
enum Scope {
    Products(Vec<ProductId>),
    All,
}

/// Releases its products (or the whole ledger) when dropped.
#[derive(Debug)]
pub struct ProductLockGuard<'a> {
    locks: &'a ProductLocks,
    scope: Scope,
}

#[cfg(test)]
impl ProductLockGuard<'_> {
    fn covers(&self, product_id: ProductId) -> bool {
        match &self.scope {
            Scope::Products(ids) => ids.binary_search(&product_id).is_ok(),
            Scope::All => true,
        }
    }
}

impl Drop for ProductLockGuard<'_> {
    fn drop(&mut self) {
        // A poisoned table still has to be released, or every waiter hangs.
        let mut table = match self.locks.table.lock() {
            Ok(t) => t,
            Err(poisoned) => poisoned.into_inner(),
        };
        match &self.scope {
            Scope::Products(ids) => {
                for id in ids {
                    table.held.remove(id);
                }
                table.active = table.active.saturating_sub(1);
            }
            Scope::All => table.exclusive = false,
        }
        drop(table);
        self.locks.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn disjoint_sets_do_not_block() {
        let locks = ProductLocks::new();
        let a = ProductId::new();
        let b = ProductId::new();

        let ga = locks.acquire(&[a]).unwrap();
        let gb = locks.acquire(&[b, b]).unwrap();

        assert!(ga.covers(a));
        assert!(!ga.covers(b));
        assert!(gb.covers(b));
    }

    #[test]
    fn overlapping_set_waits_for_release() {
        let locks = Arc::new(ProductLocks::new());
        let a = ProductId::new();
        let b = ProductId::new();
        let acquired = Arc::new(AtomicBool::new(false));

        let guard = locks.acquire(&[a]).unwrap();

        let handle = {
            let locks = locks.clone();
            let acquired = acquired.clone();
            thread::spawn(move || {
                let _g = locks.acquire(&[b, a]).unwrap();
                acquired.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!acquired.load(Ordering::SeqCst));

        drop(guard);
        handle.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }

    #[test]
    fn acquire_all_waits_for_writers_and_blocks_new_ones() {
        let locks = Arc::new(ProductLocks::new());
        let a = ProductId::new();

        let writer = locks.acquire(&[a]).unwrap();
        let exclusive_taken = Arc::new(AtomicBool::new(false));

        let handle = {
            let locks = locks.clone();
            let exclusive_taken = exclusive_taken.clone();
            thread::spawn(move || {
                let g = locks.acquire_all().unwrap();
                exclusive_taken.store(true, Ordering::SeqCst);
                assert!(g.covers(ProductId::new()));
                thread::sleep(Duration::from_millis(20));
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!exclusive_taken.load(Ordering::SeqCst));
        drop(writer);

        handle.join().unwrap();
        assert!(exclusive_taken.load(Ordering::SeqCst));
        // Released again.
        let _g = locks.acquire(&[a]).unwrap();
    }
}
