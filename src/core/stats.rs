//! Summary statistics over a ledger
use crate::core::change::percent_of;
use crate::core::ledger::LedgerEntry;
use crate::core::lookback::{Lookback, compare_points};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

/// A change between two points of the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodChange {
    pub from_date: NaiveDate,
    pub from_value: Decimal,
    pub delta: Decimal,
    pub percent_delta: Option<Decimal>,
}

impl PeriodChange {
    fn between(from: (NaiveDate, Decimal), to_value: Decimal) -> Self {
        let delta = to_value - from.1;
        Self {
            from_date: from.0,
            from_value: from.1,
            delta,
            percent_delta: percent_of(delta, from.1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerStats {
    pub latest_date: NaiveDate,
    pub latest_value: Decimal,
    pub daily: Option<PeriodChange>,
    pub lookback: Lookback,
    pub year_to_date: PeriodChange,
    pub year_max: (NaiveDate, Decimal),
    pub year_min: (NaiveDate, Decimal),
    /// Day-over-day value changes within the year.
    pub changes_in_year: usize,
}

impl LedgerStats {
    /// Statistics over ledger rows, reading each row's value through `value_of`.
    ///
    /// Works for both the primary and the normalized ledger.
    pub fn from_entries<R, F>(
        entries: &[R],
        today: NaiveDate,
        horizon_days: i64,
        value_of: F,
    ) -> Option<Self>
    where
        R: AsRef<LedgerEntry>,
        F: Fn(&R) -> Option<Decimal>,
    {
        let points: Vec<(NaiveDate, Option<Decimal>)> = entries
            .iter()
            .map(|row| (row.as_ref().check_date, value_of(row)))
            .collect();
        Self::from_points(&points, today, horizon_days)
    }

    /// Computes statistics over `(check_date, value)` points.
    ///
    /// Points with no value are skipped. Year figures cover the calendar year
    /// of `today`, or the whole series when that year holds no points.
    /// Returns `None` when there is nothing to summarise.
    pub fn from_points(
        points: &[(NaiveDate, Option<Decimal>)],
        today: NaiveDate,
        horizon_days: i64,
    ) -> Option<Self> {
        let mut series: Vec<(NaiveDate, Decimal)> = points
            .iter()
            .filter_map(|(date, value)| value.map(|v| (*date, v)))
            .collect();
        series.sort_by_key(|(date, _)| *date);

        let (latest_date, latest_value) = *series.last()?;

        let daily = series
            .len()
            .checked_sub(2)
            .map(|i| PeriodChange::between(series[i], latest_value));

        let lookback = compare_points(
            &series[..series.len() - 1],
            today,
            latest_value,
            horizon_days,
        );

        let this_year: Vec<(NaiveDate, Decimal)> = series
            .iter()
            .copied()
            .filter(|(date, _)| date.year() == today.year())
            .collect();
        let year = if this_year.is_empty() {
            &series
        } else {
            &this_year
        };

        let year_to_date = PeriodChange::between(year[0], latest_value);
        let year_max = year
            .iter()
            .copied()
            .fold(year[0], |best, p| if p.1 > best.1 { p } else { best });
        let year_min = year
            .iter()
            .copied()
            .fold(year[0], |best, p| if p.1 < best.1 { p } else { best });
        let changes_in_year = year.windows(2).filter(|w| w[0].1 != w[1].1).count();

        Some(Self {
            latest_date,
            latest_value,
            daily,
            lookback,
            year_to_date,
            year_max,
            year_min,
            changes_in_year,
        })
    }
}
