//! Receipt codes and valuation.
//!
//! A receipt is the human-facing view of a coded ledger entry: `PN0001` for the first
//! inbound receipt, `PX0001` for the first outbound one (prefixes and width are
//! configurable).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, EntryId, ProductId};

use crate::movement::{Direction, LedgerEntry};

/// Sequential, human-facing receipt identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptCode(String);

impl ReceiptCode {
    pub fn new(code: impl Into<String>) -> DomainResult<Self> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(DomainError::validation("receipt code cannot be empty"));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ReceiptCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Prefix + zero-padded counter format for one direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptCodeFormat {
    pub prefix: String,
    pub width: usize,
}

impl ReceiptCodeFormat {
    pub fn new(prefix: impl Into<String>, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            width,
        }
    }

    /// Defaults: `PN` (inbound) and `PX` (outbound), four digits.
    pub fn default_for(direction: Direction) -> Self {
        match direction {
            Direction::Inbound => Self::new("PN", 4),
            Direction::Outbound => Self::new("PX", 4),
        }
    }

    pub fn format(&self, number: u64) -> ReceiptCode {
        ReceiptCode(format!("{}{:0width$}", self.prefix, number, width = self.width))
    }

    /// Counter value of a code in this format, if it is one.
    pub fn parse(&self, code: &ReceiptCode) -> Option<u64> {
        let digits = code.as_str().strip_prefix(self.prefix.as_str())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

/// One valued receipt line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u64,
    pub unit_price: u64,
    pub amount: u64,
}

/// A coded ledger entry with its valuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub entry_id: EntryId,
    pub code: ReceiptCode,
    pub direction: Direction,
    pub lines: Vec<ReceiptLine>,
    pub total_quantity: u64,
    pub total_amount: u64,
    pub created_at: DateTime<Utc>,
}

impl Receipt {
    /// Value a committed entry using the prices captured when it was written.
    pub fn from_entry(entry: &LedgerEntry) -> DomainResult<Self> {
        let code = entry
            .code()
            .cloned()
            .ok_or_else(|| DomainError::validation("entry has no receipt code"))?;

        let overflow = || DomainError::validation("receipt total is too large");
        let mut lines = Vec::with_capacity(entry.lines().len());
        let mut total_quantity: u64 = 0;
        let mut total_amount: u64 = 0;

        for l in entry.lines() {
            let quantity = l.quantity.get();
            let amount = quantity.checked_mul(l.unit_price).ok_or_else(overflow)?;
            total_quantity = total_quantity.checked_add(quantity).ok_or_else(overflow)?;
            total_amount = total_amount.checked_add(amount).ok_or_else(overflow)?;
            lines.push(ReceiptLine {
                product_id: l.product_id,
                product_name: l.product_name.clone(),
                quantity,
                unit_price: l.unit_price,
                amount,
            });
        }

        Ok(Self {
            entry_id: entry.id_typed(),
            code,
            direction: entry.direction(),
            lines,
            total_quantity,
            total_amount,
            created_at: entry.created_at(),
        })
    }
}
