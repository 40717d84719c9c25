//! On-demand stock aggregation over ledger entries.
//!
//! These are the reference definitions of a balance: Σ inbound − Σ outbound. Cached
//! projections are checked against them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use stockledger_core::ProductId;

use crate::movement::LedgerEntry;

/// Current stock of one catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_id: ProductId,
    pub name: String,
    pub stock: i64,
}

/// Narrow an aggregated balance to `i64`, saturating at the bounds.
///
/// Sums are taken in `i128` so the order of entries cannot overflow them. The engine
/// keeps every committed balance within `0..=i64::MAX`, so saturation only shows on a
/// ledger written around it.
pub(crate) fn saturate_balance(total: i128) -> i64 {
    i64::try_from(total).unwrap_or(if total < 0 { i64::MIN } else { i64::MAX })
}

/// Balance of one product: 0 when no entry touches it.
pub fn balance_from_entries<'a>(
    product_id: ProductId,
    entries: impl IntoIterator<Item = &'a LedgerEntry>,
) -> i64 {
    let mut total: i128 = 0;
    for entry in entries {
        for line in entry.lines().iter().filter(|l| l.product_id == product_id) {
            total += i128::from(line.quantity.signed(entry.direction()));
        }
    }
    saturate_balance(total)
}

/// Balances of every product touched by `entries`, in a single pass.
pub fn balances_from_entries<'a>(
    entries: impl IntoIterator<Item = &'a LedgerEntry>,
) -> HashMap<ProductId, i64> {
    let mut totals: HashMap<ProductId, i128> = HashMap::new();
    for entry in entries {
        for line in entry.lines() {
            *totals.entry(line.product_id).or_insert(0) += i128::from(line.quantity.signed(entry.direction()));
        }
    }
    totals
        .into_iter()
        .map(|(product_id, total)| (product_id, saturate_balance(total)))
        .collect()
}
