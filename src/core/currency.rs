//! Exchange-rate provider abstractions

use crate::core::error::TrackerError;
use crate::core::rates::{ExchangeRateObservation, RateTable};
use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Short name used in logs and error reports.
    fn name(&self) -> &str;

    /// Fetches the provider's full daily series.
    async fn fetch_rates(&self) -> Result<Vec<ExchangeRateObservation>>;
}

/// Tries a priority-ordered list of providers until one returns data.
pub struct FallbackRateProvider {
    providers: Vec<Box<dyn RateProvider>>,
}

impl FallbackRateProvider {
    pub fn new(providers: Vec<Box<dyn RateProvider>>) -> Self {
        Self { providers }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Returns the first non-empty series as a [`RateTable`], or
    /// [`TrackerError::RateSourceUnavailable`] listing every failure.
    pub async fn fetch_table(&self) -> Result<RateTable, TrackerError> {
        let mut failures = Vec::new();

        for provider in &self.providers {
            debug!("Fetching exchange rates from {}", provider.name());
            match provider.fetch_rates().await {
                Ok(series) if series.is_empty() => {
                    warn!("Rate provider {} returned no rates", provider.name());
                    failures.push(format!("{}: empty rate series", provider.name()));
                }
                Ok(series) => {
                    let table: RateTable = series.into_iter().collect();
                    info!(
                        provider = provider.name(),
                        rows = table.len(),
                        first = ?table.first_date(),
                        last = ?table.last_date(),
                        "Loaded exchange rates"
                    );
                    return Ok(table);
                }
                Err(e) => {
                    warn!("Rate provider {} failed: {:#}", provider.name(), e);
                    failures.push(format!("{}: {:#}", provider.name(), e));
                }
            }
        }

        if failures.is_empty() {
            failures.push("no rate providers configured".to_string());
        }
        Err(TrackerError::RateSourceUnavailable(failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::tests::date;
    use anyhow::anyhow;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockProvider {
        name: String,
        rates: Option<Vec<ExchangeRateObservation>>,
        call_count: Arc<AtomicUsize>,
    }

    impl MockProvider {
        fn boxed(
            name: &str,
            rates: Option<Vec<ExchangeRateObservation>>,
            call_count: &Arc<AtomicUsize>,
        ) -> Box<dyn RateProvider> {
            Box::new(Self {
                name: name.to_string(),
                rates,
                call_count: Arc::clone(call_count),
            })
        }
    }

    #[async_trait]
    impl RateProvider for MockProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch_rates(&self) -> Result<Vec<ExchangeRateObservation>> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.rates
                .clone()
                .ok_or_else(|| anyhow!("connection refused"))
        }
    }

    fn series(rate: rust_decimal::Decimal) -> Vec<ExchangeRateObservation> {
        vec![ExchangeRateObservation {
            date: date("2025-03-07"),
            rate,
        }]
    }

    #[tokio::test]
    async fn test_first_successful_provider_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = FallbackRateProvider::new(vec![
            MockProvider::boxed("primary", Some(series(dec!(1000))), &calls),
            MockProvider::boxed("backup", Some(series(dec!(2000))), &calls),
        ]);

        let table = provider.fetch_table().await.unwrap();
        assert_eq!(table.rate_as_of(date("2025-03-07")), Some(dec!(1000)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_and_empty_providers_are_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = FallbackRateProvider::new(vec![
            MockProvider::boxed("primary", None, &calls),
            MockProvider::boxed("empty", Some(Vec::new()), &calls),
            MockProvider::boxed("backup", Some(series(dec!(2000))), &calls),
        ]);

        let table = provider.fetch_table().await.unwrap();
        assert_eq!(table.rate_as_of(date("2025-03-07")), Some(dec!(2000)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_all_providers_failing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = FallbackRateProvider::new(vec![
            MockProvider::boxed("primary", None, &calls),
            MockProvider::boxed("backup", None, &calls),
        ]);

        let err = provider.fetch_table().await.unwrap_err();
        match err {
            TrackerError::RateSourceUnavailable(failures) => {
                assert_eq!(
                    failures,
                    vec![
                        "primary: connection refused".to_string(),
                        "backup: connection refused".to_string()
                    ]
                );
            }
            other => panic!("Unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_no_providers_configured() {
        let provider = FallbackRateProvider::new(Vec::new());
        assert!(provider.is_empty());
        assert!(matches!(
            provider.fetch_table().await,
            Err(TrackerError::RateSourceUnavailable(_))
        ));
    }
}
