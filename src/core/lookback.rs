//! Rolling comparison against the ledger entry ~N days in the past

use crate::core::change::percent_of;
use crate::core::ledger::LedgerEntry;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

pub const DEFAULT_HORIZON_DAYS: i64 = 30;

/// The baseline a lookback comparison was made against.
#[derive(Debug, Clone, PartialEq)]
pub struct LookbackReference {
    pub reference_date: NaiveDate,
    pub reference_value: Decimal,
    /// Days between the reference's `check_date` and today.
    pub reference_age_days: i64,
    pub current_value: Decimal,
    pub delta: Decimal,
    /// Zero when the reference value is zero, see `percent_undefined`.
    pub percent_delta: Decimal,
    /// The reference is younger than the horizon: the ledger holds nothing old enough.
    pub degraded: bool,
    pub percent_undefined: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lookback {
    Available(LookbackReference),
    Unavailable,
}

impl Lookback {
    pub fn reference(&self) -> Option<&LookbackReference> {
        match self {
            Lookback::Available(reference) => Some(reference),
            Lookback::Unavailable => None,
        }
    }
}

/// Compares `current_value` with the ledger as it stood `horizon_days` ago.
///
/// The reference is the latest entry whose `check_date` is on or before
/// `today - horizon_days`. Young ledgers with no such entry fall back to their
/// oldest entry, as long as it is at least one day old.
pub fn compare(
    ledger: &[LedgerEntry],
    today: NaiveDate,
    current_value: Decimal,
    horizon_days: i64,
) -> Lookback {
    let points: Vec<(NaiveDate, Decimal)> =
        ledger.iter().map(|e| (e.check_date, e.value)).collect();
    compare_points(&points, today, current_value, horizon_days)
}

/// Same as [`compare`] over plain `(date, value)` points, in any order.
pub fn compare_points(
    points: &[(NaiveDate, Decimal)],
    today: NaiveDate,
    current_value: Decimal,
    horizon_days: i64,
) -> Lookback {
    let target_date = today - Duration::days(horizon_days);

    let on_horizon = points
        .iter()
        .filter(|(date, _)| *date <= target_date)
        .max_by_key(|(date, _)| *date);

    let (reference_date, reference_value, degraded) = match on_horizon {
        Some((date, value)) => (*date, *value, false),
        None => match points.iter().min_by_key(|(date, _)| *date) {
            Some((date, value)) if (today - *date).num_days() > 0 => (*date, *value, true),
            _ => return Lookback::Unavailable,
        },
    };

    let delta = current_value - reference_value;
    let percent = percent_of(delta, reference_value);

    Lookback::Available(LookbackReference {
        reference_date,
        reference_value,
        reference_age_days: (today - reference_date).num_days(),
        current_value,
        delta,
        percent_delta: percent.unwrap_or(Decimal::ZERO),
        degraded,
        percent_undefined: percent.is_none(),
    })
}
