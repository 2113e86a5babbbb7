//! Daily exchange-rate series with as-of lookup

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRateObservation {
    pub date: NaiveDate,
    pub rate: Decimal,
}

/// Rates keyed by date. Inserting a date twice keeps the last rate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: BTreeMap<NaiveDate, Decimal>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, observation: ExchangeRateObservation) {
        self.rates.insert(observation.date, observation.rate);
    }

    /// The rate of the latest observation on or before `date`.
    ///
    /// Weekends and holidays resolve to the previous trading day. `None` means
    /// `date` predates the whole series.
    pub fn rate_as_of(&self, date: NaiveDate) -> Option<Decimal> {
        self.rates
            .range(..=date)
            .next_back()
            .map(|(_, rate)| *rate)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rates.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rates.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl FromIterator<ExchangeRateObservation> for RateTable {
    fn from_iter<I: IntoIterator<Item = ExchangeRateObservation>>(iter: I) -> Self {
        let mut table = RateTable::new();
        for observation in iter {
            table.insert(observation);
        }
        table
    }
}
