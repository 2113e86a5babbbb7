use crate::core::change::{DailyChange, detect};
use crate::core::ledger::{AcceptOutcome, LedgerEntry, LedgerStore};
use crate::core::lookback::{Lookback, compare};
use crate::core::notify::Notifier;
use crate::core::price::PriceSource;
use crate::core::report::{daily_report, monthly_report};
use crate::core::store::AppendLog;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    Recorded {
        entry: LedgerEntry,
        change: DailyChange,
        lookback: Lookback,
    },
    AlreadyChecked,
}

/// One tracking run: fetch, record, compare and notify.
///
/// A failed fetch aborts before the ledger is opened. Notifier failures are
/// logged and do not fail the run.
pub async fn run<B: AppendLog<LedgerEntry>>(
    source: &dyn PriceSource,
    backend: B,
    notifiers: &[Box<dyn Notifier>],
    label: &str,
    horizon_days: i64,
    now: NaiveDateTime,
) -> Result<TrackOutcome> {
    let observation = source
        .fetch_observation()
        .await
        .context("Failed to fetch the current price")?;

    let today = now.date();
    let mut ledger = LedgerStore::open(backend).context("Failed to open the ledger")?;
    let previous = ledger.last_entry().cloned();

    let entry = match ledger.accept(&observation, today)? {
        AcceptOutcome::Accepted(entry) => entry,
        AcceptOutcome::Skipped(reason) => {
            info!(?reason, %today, "Nothing recorded");
            return Ok(TrackOutcome::AlreadyChecked);
        }
    };

    let change = detect(previous.as_ref(), observation.value);
    let lookback = compare(ledger.entries(), today, observation.value, horizon_days);
    info!(
        kind = ?change.kind,
        delta = %change.delta,
        lookback_available = lookback.reference().is_some(),
        "Price checked"
    );

    let daily = daily_report(label, &observation, &change, now);
    let monthly = monthly_report(&lookback);
    for notifier in notifiers {
        if let Err(e) = notifier.notify(&daily, monthly.as_deref()).await {
            warn!(notifier = notifier.name(), "Notification failed: {:#}", e);
        }
    }

    Ok(TrackOutcome::Recorded {
        entry,
        change,
        lookback,
    })
}
