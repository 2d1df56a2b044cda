// Data processing pipeline: ingestion, processing, and persistence

pub mod ingestion;
pub mod processing;

use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, info_span, instrument, warn};
use uuid::Uuid;

use crate::config::EtlConfig;
use crate::error::{EtlError, Result};
use crate::metrics::TransformMetrics;
use crate::pipeline::ingestion::{LoadReport, RecordLoader};
use crate::pipeline::processing::{
    reconcile, to_canonical, ReconcileReport, SchemaNormalizer, TextSource,
};
use crate::report::{Reporter, SentimentSummary, SummaryReporter};
use crate::storage::{ensure_schema, persist_frame, SentimentStore, SqliteStore};
use crate::types::SentimentFrame;

/// Output of Extract + Transform, before anything is persisted
#[derive(Debug, Clone, Serialize)]
pub struct PreparedBatch {
    pub load: LoadReport,
    pub text_source: TextSource,
    pub reconcile: ReconcileReport,
    pub frame: SentimentFrame,
}

/// Result of a complete pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub load: LoadReport,
    pub text_source: TextSource,
    pub reconcile: ReconcileReport,
    pub rows_stored: usize,
    /// `None` when reporting failed after the batch was committed
    pub summary: Option<SentimentSummary>,
    pub report_error: Option<String>,
    pub frame: SentimentFrame,
}

/// Extract → Transform → Load → Report over one input file.
///
/// The pipeline owns its store and reporter; both are chosen at
/// construction so tests can swap in temporary or in-memory locations.
pub struct Pipeline {
    config: EtlConfig,
    store: Box<dyn SentimentStore>,
    reporter: Box<dyn Reporter>,
}

impl Pipeline {
    pub fn new(config: EtlConfig, store: Box<dyn SentimentStore>, reporter: Box<dyn Reporter>) -> Self {
        Self {
            config,
            store,
            reporter,
        }
    }

    /// SQLite store at `config.db_path` and a JSON summary in `config.output_dir`.
    pub fn from_config(config: EtlConfig) -> Result<Self> {
        config.validate()?;
        let store = SqliteStore::open(&config.db_path)?;
        let reporter = SummaryReporter::from_config(&config);
        Ok(Self::new(config, Box::new(store), Box::new(reporter)))
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn SentimentStore {
        self.store.as_ref()
    }

    /// Create the storage table if it is absent.
    pub fn init_schema(&self) -> Result<()> {
        ensure_schema(self.store.as_ref(), &self.config.table_name)
    }

    /// Run Extract and Transform only. Storage is not touched.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn prepare<P: AsRef<Path>>(path: P) -> Result<PreparedBatch> {
        let (table, load) = RecordLoader::load(path)?;

        let started = Instant::now();
        let normalized = SchemaNormalizer::normalize(&table);
        let candidates = to_canonical(&normalized);
        let (records, reconciled) = reconcile(candidates);
        TransformMetrics::record_reconcile(
            reconciled.input_rows,
            reconciled.duplicates_dropped,
            reconciled.empty_dropped,
            reconciled.kept,
        );
        TransformMetrics::record_duration(started.elapsed().as_secs_f64());

        info!(
            "🔧 Reconciled {} rows: {} kept, {} duplicates, {} empty",
            reconciled.input_rows, reconciled.kept, reconciled.duplicates_dropped, reconciled.empty_dropped
        );

        if normalized.text_source == TextSource::Missing && reconciled.input_rows > 0 {
            return Err(EtlError::Schema(
                "no text, sentence or Top* column found; no usable rows".to_string(),
            ));
        }

        Ok(PreparedBatch {
            load,
            text_source: normalized.text_source,
            reconcile: reconciled,
            frame: SentimentFrame::new(records),
        })
    }

    /// Full run. Every hard failure happens before rows are appended, so a
    /// failed run leaves the store unchanged. Once the batch is committed
    /// the run succeeds; a reporting failure is returned in `report_error`.
    pub fn run<P: AsRef<Path>>(&self, path: P) -> Result<PipelineResult> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id);
        let _enter = span.enter();
        let t_pipeline = Instant::now();
        info!("🚀 Starting pipeline for {}", path.as_ref().display());

        // Step 1 + 2: Extract and Transform
        let batch = Self::prepare(path)?;
        if batch.load.degraded() {
            warn!(
                "Input loaded in degraded mode ({:?}); source sha256={}",
                batch.load.mode, batch.load.source_sha256
            );
        }

        // Output location is checked before Load
        self.reporter.prepare()?;

        // Step 3: Load
        self.init_schema()?;
        let rows_stored = persist_frame(self.store.as_ref(), &self.config.table_name, &batch.frame)?;

        // Step 4: Report
        let (summary, report_error) = match self.reporter.report(&batch.frame) {
            Ok(summary) => (Some(summary), None),
            Err(e) => {
                error!("Reporting failed after {} rows were stored: {}", rows_stored, e);
                (None, Some(e.to_string()))
            }
        };

        info!(
            "✅ Pipeline finished in {:.2}s: {} rows stored",
            t_pipeline.elapsed().as_secs_f64(),
            rows_stored
        );

        Ok(PipelineResult {
            run_id,
            load: batch.load,
            text_source: batch.text_source,
            reconcile: batch.reconcile,
            rows_stored,
            summary,
            report_error,
            frame: batch.frame,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn pipeline(store: InMemoryStore, out: &Path) -> Pipeline {
        let config = EtlConfig {
            output_dir: out.to_path_buf(),
            ..EtlConfig::default()
        };
        let reporter = SummaryReporter::from_config(&config);
        Pipeline::new(config, Box::new(store), Box::new(reporter))
    }

    #[test]
    fn test_run_stores_reconciled_rows() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let input = csv_file("Date,Text,Label\n2020-01-01,Good day,1\n2020-01-02,Good day,0\n2020-01-03,,1\n");
        let p = pipeline(InMemoryStore::new(), dir.path());

        let result = p.run(input.path())?;
        assert_eq!(result.rows_stored, 1);
        assert_eq!(result.reconcile.duplicates_dropped, 1);
        assert_eq!(result.reconcile.empty_dropped, 1);
        assert_eq!(p.store().count_rows("sentiments")?, 1);
        assert!(dir.path().join("sentiment_summary.json").exists());
        Ok(())
    }

    #[test]
    fn test_missing_text_source_is_schema_error() {
        let input = csv_file("Date,Label\n2020-01-01,1\n");
        let err = Pipeline::prepare(input.path()).unwrap_err();
        assert!(matches!(err, EtlError::Schema(_)));
    }

    #[test]
    fn test_header_only_input_without_text_column_is_empty_batch() -> anyhow::Result<()> {
        let input = csv_file("Date,Label\n");
        let batch = Pipeline::prepare(input.path())?;
        assert_eq!(batch.text_source, TextSource::Missing);
        assert!(batch.frame.is_empty());
        Ok(())
    }

    #[test]
    fn test_persistence_error_propagates_and_skips_report() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let out = dir.path().join("out");
        let input = csv_file("text\nhello\n");
        let p = pipeline(InMemoryStore::failing(), &out);

        let err = p.run(input.path()).unwrap_err();
        assert!(err.is_persistence());
        assert!(!out.join("sentiment_summary.json").exists());
        Ok(())
    }

    #[test]
    fn test_unusable_output_dir_fails_before_rows_are_stored() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let blocker = dir.path().join("plots");
        std::fs::write(&blocker, b"")?;
        let input = csv_file("text\nhello\n");
        let p = pipeline(InMemoryStore::new(), &blocker);

        for _ in 0..2 {
            let err = p.run(input.path()).unwrap_err();
            assert!(matches!(err, EtlError::Report(_)));
        }
        // retrying the failed run did not append anything
        p.init_schema()?;
        assert_eq!(p.store().count_rows("sentiments")?, 0);
        Ok(())
    }

    struct BrokenReporter;

    impl Reporter for BrokenReporter {
        fn report(&self, _frame: &SentimentFrame) -> Result<SentimentSummary> {
            Err(EtlError::Report("disk full".to_string()))
        }
    }

    #[test]
    fn test_report_failure_after_commit_is_recorded_not_fatal() -> anyhow::Result<()> {
        let input = csv_file("text\nhello\n");
        let p = Pipeline::new(EtlConfig::default(), Box::new(InMemoryStore::new()), Box::new(BrokenReporter));

        let result = p.run(input.path())?;
        assert_eq!(result.rows_stored, 1);
        assert!(result.summary.is_none());
        assert_eq!(result.report_error.as_deref(), Some("Report error: disk full"));
        assert_eq!(p.store().count_rows("sentiments")?, 1);
        Ok(())
    }

    #[test]
    fn test_unreadable_input_is_ingest_error() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let p = pipeline(InMemoryStore::new(), dir.path());
        let err = p.run(dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, EtlError::Ingest { .. }));
        Ok(())
    }
}
