//! Price observations and the source that produces them

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single price reading delivered by a [`PriceSource`] for the current run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// When the price officially became effective, as published by the source.
    pub effective_date: NaiveDateTime,
    pub value: Decimal,
    pub source_label: String,
}

/// Supplies the newest observation of the tracked metric.
///
/// Implementations return [`crate::core::TrackerError::SourceUnavailable`] or
/// [`crate::core::TrackerError::NoMatchingRecord`] (wrapped in `anyhow`) when
/// nothing usable could be read; callers must abort before touching the ledger.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_observation(&self) -> Result<PriceObservation>;
}
