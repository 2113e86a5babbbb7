//! Error taxonomy shared by the tracker and its collaborators

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// The price dataset could not be fetched or parsed.
    #[error("price source unavailable: {0}")]
    SourceUnavailable(String),

    /// The dataset was readable but no row matched the search criteria.
    #[error("no record matching product '{product}' and company '{company}'")]
    NoMatchingRecord { product: String, company: String },

    /// Every configured exchange-rate provider failed.
    #[error("exchange-rate source unavailable: {}", .0.join("; "))]
    RateSourceUnavailable(Vec<String>),

    #[error("invalid value '{value}' in column '{column}' at row {row}")]
    InvalidRecord {
        row: usize,
        column: String,
        value: String,
    },

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for TrackerError {
    fn from(e: std::io::Error) -> Self {
        TrackerError::Storage(e.to_string())
    }
}

impl From<csv::Error> for TrackerError {
    fn from(e: csv::Error) -> Self {
        TrackerError::Storage(e.to_string())
    }
}

pub type Result<T, E = TrackerError> = std::result::Result<T, E>;
