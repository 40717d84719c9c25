use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{EntryId, ProductId};
use stockledger_events::Event;

use crate::movement::{Direction, LedgerEntry, LedgerLine};

/// Event: EntryRecorded (a ledger entry was appended).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecorded {
    pub entry_id: EntryId,
    pub direction: Direction,
    pub lines: Vec<LedgerLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: EntryRemoved (a ledger entry was deleted; its stock effect is reversed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRemoved {
    pub entry_id: EntryId,
    pub direction: Direction,
    pub lines: Vec<LedgerLine>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    EntryRecorded(EntryRecorded),
    EntryRemoved(EntryRemoved),
}

impl LedgerEvent {
    pub fn recorded(entry: &LedgerEntry) -> Self {
        LedgerEvent::EntryRecorded(EntryRecorded {
            entry_id: entry.id_typed(),
            direction: entry.direction(),
            lines: entry.lines().to_vec(),
            occurred_at: entry.created_at(),
        })
    }

    pub fn removed(entry: &LedgerEntry, occurred_at: DateTime<Utc>) -> Self {
        LedgerEvent::EntryRemoved(EntryRemoved {
            entry_id: entry.id_typed(),
            direction: entry.direction(),
            lines: entry.lines().to_vec(),
            occurred_at,
        })
    }

    pub fn entry_id(&self) -> EntryId {
        match self {
            LedgerEvent::EntryRecorded(e) => e.entry_id,
            LedgerEvent::EntryRemoved(e) => e.entry_id,
        }
    }

    /// Signed stock change per line: a removal applies the inverse of the recording.
    pub fn stock_deltas(&self) -> Vec<(ProductId, i64)> {
        let (direction, lines, inverse) = match self {
            LedgerEvent::EntryRecorded(e) => (e.direction, &e.lines, false),
            LedgerEvent::EntryRemoved(e) => (e.direction, &e.lines, true),
        };

        lines
            .iter()
            .map(|l| {
                let delta = l.quantity.signed(direction);
                (l.product_id, if inverse { -delta } else { delta })
            })
            .collect()
    }
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::EntryRecorded(_) => "inventory.entry.recorded",
            LedgerEvent::EntryRemoved(_) => "inventory.entry.removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::EntryRecorded(e) => e.occurred_at,
            LedgerEvent::EntryRemoved(e) => e.occurred_at,
        }
    }
}
