use crate::core::currency::FallbackRateProvider;
use crate::core::ledger::{LedgerEntry, LedgerStore};
use crate::core::normalize::{NormalizedLedgerEntry, normalize_new_rows, pending_check_dates};
use crate::core::store::AppendLog;
use anyhow::{Context, Result};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOutcome {
    pub appended: usize,
    /// Appended rows that had no usable rate.
    pub unresolved: usize,
}

/// Brings the normalized ledger up to date with the primary ledger.
///
/// Rates are only fetched when there is something to normalize. The primary
/// ledger is only read.
pub async fn run<L, N>(ledger: L, normalized: N, rates: &FallbackRateProvider) -> Result<SyncOutcome>
where
    L: AppendLog<LedgerEntry>,
    N: AppendLog<NormalizedLedgerEntry>,
{
    let ledger = LedgerStore::open(ledger).context("Failed to open the ledger")?;
    let existing = normalized
        .load()
        .context("Failed to read the normalized ledger")?;

    let pending = pending_check_dates(ledger.entries(), &existing);
    if pending.is_empty() {
        info!("Normalized ledger is up to date");
        return Ok(SyncOutcome::default());
    }
    info!(pending = pending.len(), "Normalizing new ledger rows");

    let table = rates.fetch_table().await?;
    let rows = normalize_new_rows(ledger.entries(), &existing, &table);
    normalized
        .append(&rows)
        .context("Failed to append to the normalized ledger")?;

    let outcome = SyncOutcome {
        appended: rows.len(),
        unresolved: rows.iter().filter(|r| r.normalized_value.is_none()).count(),
    };
    info!(
        appended = outcome.appended,
        unresolved = outcome.unresolved,
        "Normalized ledger synced"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::RateProvider;
    use crate::core::error::TrackerError;
    use crate::core::ledger::tests::{date, entry};
    use crate::core::rates::ExchangeRateObservation;
    use crate::store::memory::MemoryLog;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticRates {
        rates: Option<Vec<ExchangeRateObservation>>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RateProvider for StaticRates {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch_rates(&self) -> Result<Vec<ExchangeRateObservation>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rates.clone().ok_or_else(|| anyhow!("HTTP 503"))
        }
    }

    fn provider(
        rates: Option<Vec<ExchangeRateObservation>>,
        calls: &Arc<AtomicUsize>,
    ) -> FallbackRateProvider {
        FallbackRateProvider::new(vec![Box::new(StaticRates {
            rates,
            calls: Arc::clone(calls),
        })])
    }

    fn friday_rate() -> Vec<ExchangeRateObservation> {
        vec![ExchangeRateObservation {
            date: date("2025-03-07"),
            rate: dec!(1000),
        }]
    }

    #[tokio::test]
    async fn test_appends_pending_rows_once() {
        let ledger = MemoryLog::with_rows(vec![
            entry("2025-03-06", dec!(1200)),
            entry("2025-03-08", dec!(1300)),
        ]);
        let normalized = MemoryLog::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let rates = provider(Some(friday_rate()), &calls);

        let outcome = run(ledger.clone(), normalized.clone(), &rates).await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome {
                appended: 2,
                unresolved: 1
            }
        );

        let rows = normalized.snapshot();
        assert_eq!(rows[0].normalized_value, None);
        assert_eq!(rows[1].normalized_value, Some(dec!(1.3)));

        // Nothing pending: no rate fetch, no rows
        let outcome = run(ledger, normalized.clone(), &rates).await.unwrap();
        assert_eq!(outcome, SyncOutcome::default());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(normalized.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_rate_failure_leaves_both_ledgers_untouched() {
        let ledger = MemoryLog::with_rows(vec![entry("2025-03-08", dec!(1300))]);
        let normalized = MemoryLog::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let err = run(ledger.clone(), normalized.clone(), &provider(None, &calls))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<TrackerError>(),
            Some(TrackerError::RateSourceUnavailable(_))
        ));
        assert_eq!(ledger.snapshot().len(), 1);
        assert!(normalized.snapshot().is_empty());
    }
}
