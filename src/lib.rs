pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::ledger::{LedgerEntry, LedgerStore};
use crate::core::normalize::NormalizedLedgerEntry;
use crate::core::store::AppendLog;
use crate::store::csv_file::CsvLog;
use anyhow::Result;
use chrono::NaiveDateTime;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Track,
    Sync,
    History { limit: usize, normalized: bool },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fuelwatch starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    run_with_config(command, &config, chrono::Local::now().naive_local()).await
}

/// Runs `command` against an already loaded configuration, as of `now`.
pub async fn run_with_config(
    command: AppCommand,
    config: &AppConfig,
    now: NaiveDateTime,
) -> Result<()> {
    let ledger = CsvLog::<LedgerEntry>::new(config.ledger_path()?);
    let normalized = CsvLog::<NormalizedLedgerEntry>::new(config.normalized_ledger_path()?);

    match command {
        AppCommand::Track => {
            let client = providers::util::http_client(config.http_timeout_secs)?;
            let source = providers::price_source(config, &client);
            let notifiers = providers::notifiers(config, &client);
            cli::track::run(
                &source,
                ledger,
                &notifiers,
                config.source.display_label(),
                config.lookback_days,
                now,
            )
            .await?;
        }
        AppCommand::Sync => {
            let client = providers::util::http_client(config.http_timeout_secs)?;
            let rates = providers::rate_providers(config, &client);
            cli::sync::run(ledger, normalized, &rates).await?;
        }
        AppCommand::History {
            limit,
            normalized: false,
        } => {
            let store = LedgerStore::open(ledger)?;
            cli::history::run_primary(store.entries(), limit, now.date(), config.lookback_days);
        }
        AppCommand::History {
            limit,
            normalized: true,
        } => {
            let rows = normalized.load()?;
            cli::history::run_normalized(&rows, limit, now.date(), config.lookback_days);
        }
    }
    Ok(())
}
