//! Storage abstractions for the append-only ledgers

use crate::core::error::Result;
use std::collections::HashMap;

/// A row that can be written to and read back from a tabular file.
///
/// `to_fields` yields the row's columns in their preferred order. Readers hand
/// `from_fields` whatever cells the file had; absent columns must be treated as
/// null rather than as an error.
pub trait TabularRow: Sized + Clone + Send + Sync {
    fn to_fields(&self) -> Vec<(String, String)>;

    /// `row` is the 1-based data row number, used in error messages.
    fn from_fields(row: usize, fields: &HashMap<String, String>) -> Result<Self>;
}

/// An append-only sequence of rows.
pub trait AppendLog<R>: Send + Sync {
    /// Reads every persisted row in file order. A missing log is empty.
    fn load(&self) -> Result<Vec<R>>;

    /// Durably appends `rows`. Values of existing rows are never modified.
    fn append(&self, rows: &[R]) -> Result<()>;
}
