//! Movement validation.
//!
//! Outbound batches are checked all-or-nothing against the balances *before* the batch
//! is applied. Lines that target the same product are summed first, so splitting a
//! withdrawal into several small lines cannot slip past the check.

use stockledger_core::{DomainError, DomainResult, ProductId};

use crate::movement::{Direction, LedgerEntry, MovementLine};

/// Shape checks shared by both directions.
pub fn validate_lines(lines: &[MovementLine]) -> DomainResult<()> {
    if lines.is_empty() {
        return Err(DomainError::validation("items required"));
    }
    // `Quantity` cannot hold zero, so only the batch shape is left to check here.
    Ok(())
}

/// Total requested quantity per product, in order of first appearance.
pub fn requested_by_product(lines: &[MovementLine]) -> DomainResult<Vec<(ProductId, u64)>> {
    let mut totals: Vec<(ProductId, u64)> = Vec::new();
    for line in lines {
        match totals.iter_mut().find(|(p, _)| *p == line.product_id) {
            Some((_, total)) => {
                *total = total
                    .checked_add(line.quantity.get())
                    .ok_or_else(|| DomainError::validation("quantity is too large"))?;
            }
            None => totals.push((line.product_id, line.quantity.get())),
        }
    }
    Ok(totals)
}

/// Reject the whole batch if any product's summed request exceeds its available stock.
///
/// `available` returns the balance before the batch. The first failing product in line
/// order is reported.
pub fn validate_outbound(
    lines: &[MovementLine],
    available: impl Fn(ProductId) -> i64,
) -> DomainResult<()> {
    validate_lines(lines)?;
    check_withdrawal(&requested_by_product(lines)?, available)
}

/// Reject the whole batch if any product's balance would pass `i64::MAX`.
///
/// Inbound movements are never checked against stock on hand, only against the
/// range a balance can hold.
pub fn validate_inbound(
    lines: &[MovementLine],
    available: impl Fn(ProductId) -> i64,
) -> DomainResult<()> {
    validate_lines(lines)?;
    check_deposit(&requested_by_product(lines)?, available)
}

/// Check that deleting `entry` keeps every balance within `0..=i64::MAX`.
///
/// Removing an inbound entry withdraws its quantities, so it is held to the same rule
/// as an outbound movement. Removing an outbound entry adds stock back like an inbound
/// movement.
pub fn validate_removal(entry: &LedgerEntry, available: impl Fn(ProductId) -> i64) -> DomainResult<()> {
    let requested = requested_by_product(&entry.movements())?;
    match entry.direction() {
        Direction::Outbound => check_deposit(&requested, available),
        Direction::Inbound => check_withdrawal(&requested, available),
    }
}

fn check_deposit(requested: &[(ProductId, u64)], available: impl Fn(ProductId) -> i64) -> DomainResult<()> {
    for &(product_id, quantity) in requested {
        let fits = i64::try_from(quantity)
            .ok()
            .and_then(|q| available(product_id).checked_add(q))
            .is_some();
        if !fits {
            return Err(DomainError::validation("stock would exceed the maximum"));
        }
    }
    Ok(())
}

fn check_withdrawal(requested: &[(ProductId, u64)], available: impl Fn(ProductId) -> i64) -> DomainResult<()> {
    for &(product_id, quantity) in requested {
        let on_hand = available(product_id);
        let enough = u64::try_from(on_hand).map(|a| quantity <= a).unwrap_or(false);
        if !enough {
            return Err(DomainError::insufficient_stock(product_id, quantity, on_hand));
        }
    }
    Ok(())
}
