pub mod energia;
pub mod rates;
pub mod telegram;
pub mod util;

use crate::core::config::{AppConfig, RateProviderConfig};
use crate::core::currency::{FallbackRateProvider, RateProvider};
use crate::core::notify::{LogNotifier, Notifier};
use energia::EnergiaDatasetSource;
use rates::{FileRateProvider, HttpCsvRateProvider};
use telegram::TelegramNotifier;
use tracing::debug;

pub fn price_source(config: &AppConfig, client: &reqwest::Client) -> EnergiaDatasetSource {
    EnergiaDatasetSource::new(
        client.clone(),
        &config.source.url,
        &config.source.product,
        &config.source.company,
    )
}

/// Rate providers in the configured priority order.
pub fn rate_providers(config: &AppConfig, client: &reqwest::Client) -> FallbackRateProvider {
    let providers = config
        .rates
        .iter()
        .map(|entry| -> Box<dyn RateProvider> {
            match entry {
                RateProviderConfig::Http { url } => {
                    Box::new(HttpCsvRateProvider::new(client.clone(), url))
                }
                RateProviderConfig::File { path } => Box::new(FileRateProvider::new(path)),
            }
        })
        .collect();
    FallbackRateProvider::new(providers)
}

/// The log notifier, plus Telegram when credentials resolve.
pub fn notifiers(config: &AppConfig, client: &reqwest::Client) -> Vec<Box<dyn Notifier>> {
    let mut notifiers: Vec<Box<dyn Notifier>> = vec![Box::new(LogNotifier)];
    match config.notifiers.telegram.clone().unwrap_or_default().resolve() {
        Some(settings) => notifiers.push(Box::new(TelegramNotifier::new(client.clone(), settings))),
        None => debug!("Telegram credentials not configured, skipping"),
    }
    notifiers
}
