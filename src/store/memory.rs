use crate::core::error::{Result, TrackerError};
use crate::core::store::AppendLog;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// In-memory append log. Clones share the same rows.
#[derive(Debug)]
pub struct MemoryLog<R> {
    inner: Arc<Mutex<Vec<R>>>,
}

impl<R: Clone> MemoryLog<R> {
    /// Creates an empty MemoryLog
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a MemoryLog seeded with existing rows
    pub fn with_rows(rows: Vec<R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(rows)),
        }
    }

    /// Returns a copy of the rows appended so far
    pub fn snapshot(&self) -> Vec<R> {
        self.inner
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }
}

impl<R> Clone for MemoryLog<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Clone> Default for MemoryLog<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Clone + Send + Sync> AppendLog<R> for MemoryLog<R> {
    fn load(&self) -> Result<Vec<R>> {
        let rows = self
            .inner
            .lock()
            .map_err(|_| TrackerError::Storage("memory log lock poisoned".to_string()))?;
        debug!("MemoryLog LOAD of {} rows", rows.len());
        Ok(rows.clone())
    }

    fn append(&self, new_rows: &[R]) -> Result<()> {
        let mut rows = self
            .inner
            .lock()
            .map_err(|_| TrackerError::Storage("memory log lock poisoned".to_string()))?;
        rows.extend_from_slice(new_rows);
        debug!("MemoryLog APPEND of {} rows", new_rows.len());
        Ok(())
    }
}
