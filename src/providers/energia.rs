use crate::core::error::TrackerError;
use crate::core::price::{PriceObservation, PriceSource};
use crate::providers::util::{fetch_text, parse_flexible_date_time, parse_local_decimal};
use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, instrument};

const PRODUCT: &str = "producto";
const COMPANY: &str = "empresa";
const PRICE: &str = "precio";
const EFFECTIVE_DATE: &str = "fecha_vigencia";

/// Reads the published retail fuel price dataset and picks the newest price
/// for one product sold by one company.
pub struct EnergiaDatasetSource {
    client: reqwest::Client,
    url: String,
    product: String,
    company: String,
}

impl EnergiaDatasetSource {
    pub fn new(client: reqwest::Client, url: &str, product: &str, company: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
            product: product.to_string(),
            company: company.to_string(),
        }
    }

    fn no_match(&self) -> TrackerError {
        TrackerError::NoMatchingRecord {
            product: self.product.clone(),
            company: self.company.clone(),
        }
    }

    /// Selects the matching row with the latest effective date.
    pub fn select(&self, body: &str) -> Result<PriceObservation, TrackerError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(body.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| TrackerError::SourceUnavailable(format!("unreadable dataset: {e}")))?
            .clone();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    TrackerError::SourceUnavailable(format!("dataset has no '{name}' column"))
                })
        };
        let (product_idx, company_idx, price_idx, date_idx) = (
            column(PRODUCT)?,
            column(COMPANY)?,
            column(PRICE)?,
            column(EFFECTIVE_DATE)?,
        );

        let wanted_product = self.product.trim().to_lowercase();
        let wanted_company = self.company.trim().to_lowercase();

        let mut matched = 0usize;
        let mut best: Option<PriceObservation> = None;
        for record in reader.records().filter_map(|r| r.ok()) {
            let cell = |idx: usize| record.get(idx).map(str::trim).unwrap_or_default();
            if !cell(product_idx).to_lowercase().contains(&wanted_product)
                || !cell(company_idx).to_lowercase().contains(&wanted_company)
            {
                continue;
            }
            matched += 1;

            let (Some(effective_date), Some(value)) = (
                parse_flexible_date_time(cell(date_idx)),
                parse_local_decimal(cell(price_idx)),
            ) else {
                debug!(
                    date = cell(date_idx),
                    price = cell(price_idx),
                    "Skipping matching row with unparsable date or price"
                );
                continue;
            };

            if best
                .as_ref()
                .is_none_or(|b| effective_date > b.effective_date)
            {
                best = Some(PriceObservation {
                    effective_date,
                    value,
                    source_label: format!("{} / {}", cell(company_idx), cell(product_idx)),
                });
            }
        }

        debug!(matched, "Filtered dataset rows");
        best.ok_or_else(|| self.no_match())
    }
}

#[async_trait]
impl PriceSource for EnergiaDatasetSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_observation(&self) -> Result<PriceObservation> {
        let body = fetch_text(&self.client, &self.url, 2, 1000)
            .await
            .map_err(|e| TrackerError::SourceUnavailable(format!("{e:#}")))?;

        let observation = self.select(&body)?;
        info!(
            value = %observation.value,
            effective_date = %observation.effective_date,
            source = %observation.source_label,
            "Fetched current price"
        );
        Ok(observation)
    }
}
