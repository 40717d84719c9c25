//! Inventory ledger domain module.
//!
//! This crate contains the business rules of the stock ledger, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage):
//! - movement lines and ledger entries (`movement`)
//! - ledger change events (`event`)
//! - on-demand stock aggregation (`stock`)
//! - movement and removal validation (`validation`)
//! - receipt codes and valuation (`receipt`)

pub mod event;
pub mod movement;
pub mod receipt;
pub mod stock;
pub mod validation;

pub use event::{EntryRecorded, EntryRemoved, LedgerEvent};
pub use movement::{Direction, LedgerEntry, LedgerLine, MovementLine, Quantity};
pub use receipt::{Receipt, ReceiptCode, ReceiptCodeFormat, ReceiptLine};
pub use stock::{StockLevel, balance_from_entries, balances_from_entries};
pub use validation::{requested_by_product, validate_inbound, validate_lines, validate_outbound, validate_removal};
