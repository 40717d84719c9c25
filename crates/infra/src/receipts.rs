use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use stockledger_inventory::{Direction, ReceiptCode, ReceiptCodeFormat};

use crate::config::LedgerConfig;
use crate::ledger_store::{LedgerStore, LedgerStoreError};

#[derive(Debug)]
struct Counter {
    format: ReceiptCodeFormat,
    last: AtomicU64,
}

impl Counter {
    fn new(format: ReceiptCodeFormat) -> Self {
        Self {
            format,
            last: AtomicU64::new(0),
        }
    }
}

/// Sequential receipt codes, one counter per direction.
///
/// Codes are handed out by `fetch_add`, so concurrent writers never see the same
/// number. A number returned by [`ReceiptSequence::release`] is reused only when no
/// later code was issued in the meantime; otherwise the sequence keeps a gap.
#[derive(Debug)]
pub struct ReceiptSequence {
    inbound: Counter,
    outbound: Counter,
}

impl Default for ReceiptSequence {
    fn default() -> Self {
        Self::new(
            ReceiptCodeFormat::default_for(Direction::Inbound),
            ReceiptCodeFormat::default_for(Direction::Outbound),
        )
    }
}

impl ReceiptSequence {
    pub fn new(inbound: ReceiptCodeFormat, outbound: ReceiptCodeFormat) -> Self {
        Self {
            inbound: Counter::new(inbound),
            outbound: Counter::new(outbound),
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.inbound.clone(), config.outbound.clone())
    }

    fn counter(&self, direction: Direction) -> &Counter {
        match direction {
            Direction::Inbound => &self.inbound,
            Direction::Outbound => &self.outbound,
        }
    }

    pub fn format(&self, direction: Direction) -> &ReceiptCodeFormat {
        &self.counter(direction).format
    }

    /// Issue the next code for `direction`.
    pub fn next_code(&self, direction: Direction) -> ReceiptCode {
        let counter = self.counter(direction);
        let number = counter.last.fetch_add(1, Ordering::SeqCst) + 1;
        counter.format.format(number)
    }

    /// Give back a code whose entry was never persisted.
    ///
    /// Returns `true` when the number will be reissued.
    pub fn release(&self, direction: Direction, code: &ReceiptCode) -> bool {
        let counter = self.counter(direction);
        let Some(number) = counter.format.parse(code).filter(|n| *n > 0) else {
            return false;
        };
        counter
            .last
            .compare_exchange(number, number - 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    #[cfg(test)]
    fn last_issued(&self, direction: Direction) -> u64 {
        self.counter(direction).last.load(Ordering::SeqCst)
    }

    /// Continue after the highest code already stored, so a restart never reissues
    /// a code. Never moves a counter backwards.
    pub fn resume_from<S>(&self, store: &S) -> Result<(), LedgerStoreError>
    where
        S: LedgerStore + ?Sized,
    {
        for direction in [Direction::Inbound, Direction::Outbound] {
            let counter = self.counter(direction);
            let highest = store.highest_code_number(direction, &counter.format)?;
            let previous = counter.last.fetch_max(highest, Ordering::SeqCst);
            debug!(%direction, highest, previous, "receipt sequence resumed");
        }
        Ok(())
    }
}
