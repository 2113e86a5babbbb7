//! Incremental conversion of the ledger into the reference currency

use crate::core::error::{Result, TrackerError};
use crate::core::ledger::{LedgerEntry, is_nan, parse_decimal};
use crate::core::rates::RateTable;
use crate::core::store::TabularRow;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

pub const NORMALIZED_VALUE: &str = "normalized_value";

/// Fractional digits kept for normalized values.
pub const NORMALIZED_SCALE: u32 = 4;

/// A ledger entry plus its value in the reference currency.
///
/// `normalized_value` is `None` when no usable rate existed on or before the
/// entry's `check_date`; such rows are still persisted so they are not retried.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLedgerEntry {
    pub entry: LedgerEntry,
    pub normalized_value: Option<Decimal>,
}

impl AsRef<LedgerEntry> for NormalizedLedgerEntry {
    fn as_ref(&self) -> &LedgerEntry {
        &self.entry
    }
}

impl TabularRow for NormalizedLedgerEntry {
    fn to_fields(&self) -> Vec<(String, String)> {
        let mut fields = self.entry.to_fields();
        fields.push((
            NORMALIZED_VALUE.to_string(),
            self.normalized_value
                .map(|v| format!("{:.4}", v.round_dp(NORMALIZED_SCALE)))
                .unwrap_or_default(),
        ));
        fields
    }

    fn from_fields(row: usize, fields: &HashMap<String, String>) -> Result<Self> {
        let mut entry = LedgerEntry::from_fields(row, fields)?;
        let normalized_value = match entry.extra.remove(NORMALIZED_VALUE) {
            Some(raw) if !raw.trim().is_empty() && !is_nan(raw.trim()) => Some(
                parse_decimal(raw.trim()).ok_or_else(|| TrackerError::InvalidRecord {
                    row,
                    column: NORMALIZED_VALUE.to_string(),
                    value: raw.clone(),
                })?,
            ),
            _ => None,
        };
        Ok(Self {
            entry,
            normalized_value,
        })
    }
}

/// Converts `value` at `rate`, rounding half to even at [`NORMALIZED_SCALE`].
///
/// Missing or zero rates yield `None`.
pub fn normalize_value(value: Decimal, rate: Option<Decimal>) -> Option<Decimal> {
    let rate = rate.filter(|r| !r.is_zero())?;
    value
        .checked_div(rate)
        .map(|v| v.round_dp_with_strategy(NORMALIZED_SCALE, RoundingStrategy::MidpointNearestEven))
}

/// `check_date`s present in `ledger` but not yet in `normalized`.
pub fn pending_check_dates(
    ledger: &[LedgerEntry],
    normalized: &[NormalizedLedgerEntry],
) -> BTreeSet<NaiveDate> {
    let done: BTreeSet<NaiveDate> = normalized.iter().map(|n| n.entry.check_date).collect();
    ledger
        .iter()
        .map(|e| e.check_date)
        .filter(|d| !done.contains(d))
        .collect()
}

/// Builds normalized rows for every ledger entry not yet normalized, in
/// ascending `check_date` order. Re-running with the result appended yields
/// nothing.
pub fn normalize_new_rows(
    ledger: &[LedgerEntry],
    normalized: &[NormalizedLedgerEntry],
    rates: &RateTable,
) -> Vec<NormalizedLedgerEntry> {
    let pending = pending_check_dates(ledger, normalized);

    let mut fresh: Vec<&LedgerEntry> = ledger
        .iter()
        .filter(|e| pending.contains(&e.check_date))
        .collect();
    fresh.sort_by_key(|e| e.check_date);
    fresh.dedup_by_key(|e| e.check_date);

    fresh
        .into_iter()
        .map(|entry| {
            let rate = rates.rate_as_of(entry.check_date);
            let normalized_value = normalize_value(entry.value, rate);
            match normalized_value {
                Some(v) => debug!(
                    check_date = %entry.check_date,
                    value = %entry.value,
                    rate = ?rate,
                    normalized = %v,
                    "Normalized ledger row"
                ),
                None => warn!(
                    check_date = %entry.check_date,
                    "No usable exchange rate on or before this date, storing an empty value"
                ),
            }
            NormalizedLedgerEntry {
                entry: entry.clone(),
                normalized_value,
            }
        })
        .collect()
}
