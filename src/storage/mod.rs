//! Persistence sink for canonical records.
//!
//! The pipeline depends only on [`SentimentStore`], a capability interface
//! with two write operations: run DDL and append rows. Stores never update or
//! delete rows they already hold.

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;

use serde::Serialize;
use std::time::Instant;
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::metrics::LoadMetrics;
use crate::types::{CanonicalRecord, SentimentFrame};

/// A stored row as read back from a store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRow {
    pub id: i64,
    pub date: Option<String>,
    pub ticker: Option<String>,
    pub text_original: Option<String>,
    pub cleaned_text: String,
    pub sentiment_label: String,
    pub sentiment_score: Option<f64>,
}

/// Storage capability used by the pipeline
pub trait SentimentStore {
    /// Execute schema DDL. Must be safe to repeat.
    fn execute_ddl(&self, ddl: &str) -> Result<()>;

    /// Append `rows` to `table` as new rows, all or nothing.
    /// Returns the number of rows written.
    fn append_rows(&self, table: &str, rows: &[CanonicalRecord]) -> Result<usize>;

    fn count_rows(&self, table: &str) -> Result<usize>;

    /// All rows of `table` in insertion order
    fn fetch_rows(&self, table: &str) -> Result<Vec<StoredRow>>;
}

/// DDL for the canonical table plus a synthetic auto-increment key.
pub fn create_table_ddl(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT,
            ticker TEXT,
            text_original TEXT,
            cleaned_text TEXT,
            sentiment_label TEXT,
            sentiment_score REAL
        );"
    )
}

/// Create the canonical table if it does not exist yet.
pub fn ensure_schema(store: &dyn SentimentStore, table: &str) -> Result<()> {
    store.execute_ddl(&create_table_ddl(table))
}

/// Append a finalized frame, recording metrics. Errors are propagated
/// unchanged.
#[instrument(skip(store, frame), fields(rows = frame.len()))]
pub fn persist_frame(store: &dyn SentimentStore, table: &str, frame: &SentimentFrame) -> Result<usize> {
    let started = Instant::now();
    match store.append_rows(table, frame.records()) {
        Ok(written) => {
            LoadMetrics::record_append_success(written, started.elapsed().as_secs_f64());
            info!("💾 Appended {} rows to '{}'", written, table);
            Ok(written)
        }
        Err(e) => {
            LoadMetrics::record_append_error();
            error!("Append to '{}' failed: {}", table, e);
            Err(e)
        }
    }
}
