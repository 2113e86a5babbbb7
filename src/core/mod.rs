//! Core business logic abstractions

pub mod change;
pub mod config;
pub mod currency;
pub mod error;
pub mod ledger;
pub mod log;
pub mod lookback;
pub mod normalize;
pub mod notify;
pub mod price;
pub mod rates;
pub mod report;
pub mod stats;
pub mod store;

// Re-export main types for cleaner imports
pub use change::{ChangeKind, DailyChange};
pub use currency::{FallbackRateProvider, RateProvider};
pub use error::TrackerError;
pub use ledger::{AcceptOutcome, LedgerEntry, LedgerStore, SkipReason};
pub use lookback::{Lookback, LookbackReference};
pub use normalize::NormalizedLedgerEntry;
pub use notify::{LogNotifier, Notifier};
pub use price::{PriceObservation, PriceSource};
pub use rates::{ExchangeRateObservation, RateTable};
pub use stats::LedgerStats;
pub use store::{AppendLog, TabularRow};
