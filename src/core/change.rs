//! Day-over-day change detection

use crate::core::ledger::LedgerEntry;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    FirstObservation,
    NoChange,
    Increase,
    Decrease,
}

/// Outcome of comparing a new value with the ledger's last entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyChange {
    pub kind: ChangeKind,
    pub previous_value: Option<Decimal>,
    pub new_value: Decimal,
    pub delta: Decimal,
    pub percent_delta: Decimal,
}

/// Percent change from `base` to `base + delta`, or `None` when `base` is zero.
pub fn percent_of(delta: Decimal, base: Decimal) -> Option<Decimal> {
    if base.is_zero() {
        return None;
    }
    delta
        .checked_div(base)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
}

/// Classifies `new_value` against the previous ledger entry.
///
/// Equality is exact: any non-zero decimal difference is a change.
pub fn detect(previous: Option<&LedgerEntry>, new_value: Decimal) -> DailyChange {
    let Some(previous) = previous else {
        return DailyChange {
            kind: ChangeKind::FirstObservation,
            previous_value: None,
            new_value,
            delta: Decimal::ZERO,
            percent_delta: Decimal::ZERO,
        };
    };

    let delta = new_value - previous.value;
    let kind = if delta.is_zero() {
        ChangeKind::NoChange
    } else if delta.is_sign_positive() {
        ChangeKind::Increase
    } else {
        ChangeKind::Decrease
    };

    DailyChange {
        kind,
        previous_value: Some(previous.value),
        new_value,
        delta,
        percent_delta: percent_of(delta, previous.value).unwrap_or(Decimal::ZERO),
    }
}
