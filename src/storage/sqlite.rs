use rusqlite::{params, Connection};
use std::path::Path;
use tracing::debug;

use super::{SentimentStore, StoredRow};
use crate::error::{EtlError, Result};
use crate::types::CanonicalRecord;

/// SQLite-backed store
pub struct SqliteStore {
    conn: Connection,
}

fn persistence(context: &'static str) -> impl FnOnce(rusqlite::Error) -> EtlError {
    move |e| EtlError::Persistence(format!("{context}: {e}"))
}

impl SqliteStore {
    /// Open (or create) the database file, creating parent directories.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                EtlError::Persistence(format!(
                    "cannot create database directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }
        let conn = Connection::open(db_path).map_err(persistence("failed to open database"))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(persistence("failed to configure database"))?;
        debug!("Opened SQLite store at {}", db_path.display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(persistence("failed to open database"))?;
        Ok(Self { conn })
    }
}

impl SentimentStore for SqliteStore {
    fn execute_ddl(&self, ddl: &str) -> Result<()> {
        self.conn
            .execute_batch(ddl)
            .map_err(persistence("schema creation failed"))
    }

    fn append_rows(&self, table: &str, rows: &[CanonicalRecord]) -> Result<usize> {
        // One transaction per batch: a failed row rolls back the whole batch
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(persistence("failed to begin transaction"))?;
        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {table} (date, ticker, text_original, cleaned_text, sentiment_label, sentiment_score)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
                ))
                .map_err(persistence("failed to prepare insert"))?;
            for row in rows {
                stmt.execute(params![
                    row.date_iso(),
                    row.ticker(),
                    row.text_original(),
                    row.cleaned_text(),
                    row.sentiment_label().as_str(),
                    row.sentiment_score(),
                ])
                .map_err(persistence("insert failed"))?;
            }
        }
        tx.commit().map_err(persistence("commit failed"))?;
        Ok(rows.len())
    }

    fn count_rows(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .map_err(persistence("count failed"))?;
        Ok(count as usize)
    }

    fn fetch_rows(&self, table: &str) -> Result<Vec<StoredRow>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT id, date, ticker, text_original, cleaned_text, sentiment_label, sentiment_score
                 FROM {table} ORDER BY id"
            ))
            .map_err(persistence("failed to prepare select"))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(StoredRow {
                    id: row.get(0)?,
                    date: row.get(1)?,
                    ticker: row.get(2)?,
                    text_original: row.get(3)?,
                    cleaned_text: row.get(4)?,
                    sentiment_label: row.get(5)?,
                    sentiment_score: row.get(6)?,
                })
            })
            .map_err(persistence("select failed"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(persistence("failed to read row"))?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{create_table_ddl, ensure_schema};
    use crate::types::SentimentLabel;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn sample(text: &str, score: Option<f64>) -> CanonicalRecord {
        let date = NaiveDate::from_ymd_opt(2020, 3, 9).unwrap().and_hms_opt(0, 0, 0).map(Into::into);
        CanonicalRecord::new(date, Some("SPY".into()), Some(text.into()), SentimentLabel::Negative, score)
    }

    #[test]
    fn test_schema_creation_is_idempotent() -> anyhow::Result<()> {
        let store = SqliteStore::open_in_memory()?;
        ensure_schema(&store, "sentiments")?;
        ensure_schema(&store, "sentiments")?;
        assert_eq!(store.count_rows("sentiments")?, 0);
        Ok(())
    }

    #[test]
    fn test_append_only_grows() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = SqliteStore::open(dir.path().join("nested").join("etl.db"))?;
        store.execute_ddl(&create_table_ddl("sentiments"))?;

        store.append_rows("sentiments", &[sample("crash", Some(-0.8))])?;
        store.append_rows("sentiments", &[sample("crash", Some(-0.8)), sample("rebound", None)])?;

        let rows = store.fetch_rows("sentiments")?;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[2].id, 3);
        assert_eq!(rows[0].date.as_deref(), Some("2020-03-09T00:00:00"));
        assert_eq!(rows[0].sentiment_label, "negative");
        assert_eq!(rows[0].sentiment_score, Some(-0.8));
        assert_eq!(rows[2].sentiment_score, None);
        Ok(())
    }

    #[test]
    fn test_unusable_database_directory_is_persistence_error() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, b"")?;

        let err = SqliteStore::open(blocker.join("etl.db")).err().expect("open should fail");
        assert!(err.is_persistence());
        Ok(())
    }

    #[test]
    fn test_missing_table_is_persistence_error() -> anyhow::Result<()> {
        let store = SqliteStore::open_in_memory()?;
        let err = store.append_rows("sentiments", &[sample("x", None)]).unwrap_err();
        assert!(matches!(err, EtlError::Persistence(_)));
        Ok(())
    }

    #[test]
    fn test_failed_batch_leaves_table_unchanged() -> anyhow::Result<()> {
        let store = SqliteStore::open_in_memory()?;
        store.execute_ddl(
            "CREATE TABLE sentiments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT, ticker TEXT, text_original TEXT UNIQUE,
                cleaned_text TEXT, sentiment_label TEXT, sentiment_score REAL
            );",
        )?;
        store.append_rows("sentiments", &[sample("kept", None)])?;

        // Second row violates the UNIQUE constraint: the whole batch rolls back
        let result = store.append_rows("sentiments", &[sample("new", None), sample("kept", None)]);
        assert!(result.is_err());
        assert_eq!(store.count_rows("sentiments")?, 1);
        Ok(())
    }
}
