use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use super::{SentimentStore, StoredRow};
use crate::error::{EtlError, Result};
use crate::types::CanonicalRecord;

/// In-memory store for development/testing
///
/// `execute_ddl` only registers the table named by a
/// `CREATE TABLE IF NOT EXISTS` statement; appends to unknown tables fail
/// the way a missing table would in SQLite.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<HashMap<String, Vec<StoredRow>>>,
    fail_appends: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose appends always fail, for exercising error paths
    pub fn failing() -> Self {
        Self {
            fail_appends: true,
            ..Self::default()
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<StoredRow>>>> {
        self.tables
            .lock()
            .map_err(|_| EtlError::Persistence("in-memory store lock poisoned".to_string()))
    }
}

fn created_table_name(ddl: &str) -> Option<String> {
    let lower = ddl.to_lowercase();
    let rest = lower.split("create table").nth(1)?;
    let rest = rest.trim_start().strip_prefix("if not exists").unwrap_or(rest);
    let name: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    (!name.is_empty()).then_some(name)
}

impl SentimentStore for InMemoryStore {
    fn execute_ddl(&self, ddl: &str) -> Result<()> {
        let name = created_table_name(ddl)
            .ok_or_else(|| EtlError::Persistence(format!("unsupported DDL: {ddl}")))?;
        self.lock()?.entry(name).or_default();
        Ok(())
    }

    fn append_rows(&self, table: &str, rows: &[CanonicalRecord]) -> Result<usize> {
        if self.fail_appends {
            return Err(EtlError::Persistence("storage unavailable".to_string()));
        }
        let mut tables = self.lock()?;
        let stored = tables
            .get_mut(&table.to_lowercase())
            .ok_or_else(|| EtlError::Persistence(format!("no such table: {table}")))?;

        let mut next_id = stored.last().map(|r| r.id).unwrap_or(0);
        for row in rows {
            next_id += 1;
            stored.push(StoredRow {
                id: next_id,
                date: row.date_iso(),
                ticker: row.ticker().map(str::to_owned),
                text_original: row.text_original().map(str::to_owned),
                cleaned_text: row.cleaned_text().to_string(),
                sentiment_label: row.sentiment_label().as_str().to_string(),
                sentiment_score: row.sentiment_score(),
            });
        }
        debug!("Appended {} rows to in-memory table {}", rows.len(), table);
        Ok(rows.len())
    }

    fn count_rows(&self, table: &str) -> Result<usize> {
        Ok(self.fetch_rows(table)?.len())
    }

    fn fetch_rows(&self, table: &str) -> Result<Vec<StoredRow>> {
        self.lock()?
            .get(&table.to_lowercase())
            .cloned()
            .ok_or_else(|| EtlError::Persistence(format!("no such table: {table}")))
    }
}
