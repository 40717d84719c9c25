use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, Entity, EntryId, ProductId, ValueObject};
use stockledger_products::Product;

use crate::receipt::ReceiptCode;
use crate::stock::saturate_balance;

/// Movement direction. Which ledger a line belongs to decides its effect on stock,
/// never the sign of a quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    /// +1 for inbound, -1 for outbound.
    pub fn sign(self) -> i64 {
        match self {
            Direction::Inbound => 1,
            Direction::Outbound => -1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strictly positive stock quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Quantity(u64);

impl Quantity {
    pub fn new(value: u64) -> DomainResult<Self> {
        if value == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if value > i64::MAX as u64 {
            return Err(DomainError::validation("quantity is too large"));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Signed stock effect of moving this quantity in `direction`.
    pub fn signed(self, direction: Direction) -> i64 {
        // `new` caps the value at i64::MAX, so the cast is lossless.
        direction.sign() * self.0 as i64
    }
}

impl TryFrom<u64> for Quantity {
    type Error = DomainError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl ValueObject for Quantity {}

/// One requested movement: a product and a positive quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementLine {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

impl MovementLine {
    pub fn new(product_id: ProductId, quantity: u64) -> DomainResult<Self> {
        Ok(Self {
            product_id,
            quantity: Quantity::new(quantity)?,
        })
    }
}

impl ValueObject for MovementLine {}

/// A persisted line of a ledger entry.
///
/// Name and unit price are copied from the catalog when the entry is written, so
/// receipts stay renderable after the product is deleted or repriced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub product_name: String,
    pub unit_price: u64,
}

impl LedgerLine {
    /// Snapshot a requested line against the product it references.
    pub fn snapshot(line: &MovementLine, product: &Product) -> DomainResult<Self> {
        if line.product_id != product.id_typed() {
            return Err(DomainError::validation("line does not reference this product"));
        }
        Ok(Self {
            product_id: line.product_id,
            quantity: line.quantity,
            product_name: product.name().to_string(),
            unit_price: product.unit_price(),
        })
    }

    pub fn movement(&self) -> MovementLine {
        MovementLine {
            product_id: self.product_id,
            quantity: self.quantity,
        }
    }
}

impl ValueObject for LedgerLine {}

/// One ledger entry: an inbound or outbound movement of one or more lines.
///
/// The entry owns its lines. `revision` is assigned by the ledger store on append
/// and is `0` for an entry that has not been committed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    id: EntryId,
    direction: Direction,
    code: Option<ReceiptCode>,
    lines: Vec<LedgerLine>,
    created_at: DateTime<Utc>,
    revision: u64,
}

impl LedgerEntry {
    pub fn new(
        id: EntryId,
        direction: Direction,
        lines: Vec<LedgerLine>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation("items required"));
        }
        Ok(Self {
            id,
            direction,
            code: None,
            lines,
            created_at,
            revision: 0,
        })
    }

    /// Attach the receipt code this entry is grouped under.
    pub fn with_code(mut self, code: ReceiptCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Mark the entry as committed at ledger position `revision`.
    pub fn committed_at(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    pub fn id_typed(&self) -> EntryId {
        self.id
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn code(&self) -> Option<&ReceiptCode> {
        self.code.as_ref()
    }

    pub fn lines(&self) -> &[LedgerLine] {
        &self.lines
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Distinct products referenced by this entry, sorted.
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<_> = self.lines.iter().map(|l| l.product_id).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Signed stock effect of this entry on one product.
    pub fn stock_effect_on(&self, product_id: ProductId) -> i64 {
        let total: i128 = self
            .lines
            .iter()
            .filter(|l| l.product_id == product_id)
            .map(|l| i128::from(l.quantity.signed(self.direction)))
            .sum();
        saturate_balance(total)
    }

    /// Requested lines, without the catalog snapshot.
    pub fn movements(&self) -> Vec<MovementLine> {
        self.lines.iter().map(LedgerLine::movement).collect()
    }
}

impl Entity for LedgerEntry {
    type Id = EntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
