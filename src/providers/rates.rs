//! Exchange-rate series read from `date,rate` CSV files

use crate::core::currency::RateProvider;
use crate::core::rates::ExchangeRateObservation;
use crate::providers::util::{fetch_text, parse_flexible_date, parse_local_decimal};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Parses a two-column rate series. The first column is the date and the
/// second the rate; a header row and unparsable rows are skipped.
pub fn parse_rate_series(body: &str) -> Vec<ExchangeRateObservation> {
    let delimiter = if body.lines().next().is_some_and(|l| l.contains(';')) {
        b';'
    } else {
        b','
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(body.as_bytes());

    let mut skipped = 0usize;
    let series: Vec<ExchangeRateObservation> = reader
        .records()
        .filter_map(|record| {
            let parsed = record.ok().and_then(|r| {
                let date = parse_flexible_date(r.get(0)?)?;
                let rate = parse_local_decimal(r.get(1)?)?;
                (rate > rust_decimal::Decimal::ZERO)
                    .then_some(ExchangeRateObservation { date, rate })
            });
            if parsed.is_none() {
                skipped += 1;
            }
            parsed
        })
        .collect();

    debug!(rows = series.len(), skipped, "Parsed rate series");
    series
}

pub struct HttpCsvRateProvider {
    client: reqwest::Client,
    url: String,
    name: String,
}

impl HttpCsvRateProvider {
    pub fn new(client: reqwest::Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
            name: format!("http({url})"),
        }
    }
}

#[async_trait]
impl RateProvider for HttpCsvRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_rates(&self) -> Result<Vec<ExchangeRateObservation>> {
        let body = fetch_text(&self.client, &self.url, 2, 1000).await?;
        Ok(parse_rate_series(&body))
    }
}

pub struct FileRateProvider {
    path: PathBuf,
    name: String,
}

impl FileRateProvider {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let name = format!("file({})", path.display());
        Self { path, name }
    }
}

#[async_trait]
impl RateProvider for FileRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rates(&self) -> Result<Vec<ExchangeRateObservation>> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read rate file: {}", self.path.display()))?;
        Ok(parse_rate_series(&body))
    }
}
