//! Extract phase metrics: file loading and schema normalization.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct ExtractMetrics;

impl ExtractMetrics {
    /// Record one loader run
    pub fn record_load(rows_read: usize, skipped_lines: usize, degraded: bool) {
        ::metrics::counter!(phase_metric!(counter, "extract", "files_loaded")).increment(1);
        ::metrics::counter!(phase_metric!(counter, "extract", "rows_read"))
            .increment(rows_read as u64);
        ::metrics::counter!(phase_metric!(counter, "extract", "lines_skipped"))
            .increment(skipped_lines as u64);
        if degraded {
            ::metrics::counter!(phase_metric!(counter, "extract", "degraded_loads")).increment(1);
        }
    }

    /// Record rows whose text had to be synthesized or was missing
    pub fn record_text_source(synthesized: usize, missing: usize) {
        ::metrics::counter!(phase_metric!(counter, "extract", "texts_synthesized"))
            .increment(synthesized as u64);
        ::metrics::counter!(phase_metric!(counter, "extract", "texts_missing"))
            .increment(missing as u64);
    }
}

impl PhaseMetrics for ExtractMetrics {
    fn register_metrics() {
        use metrics::counter;

        let _ = counter!(phase_metric!(counter, "extract", "files_loaded"));
        let _ = counter!(phase_metric!(counter, "extract", "rows_read"));
        let _ = counter!(phase_metric!(counter, "extract", "lines_skipped"));
        let _ = counter!(phase_metric!(counter, "extract", "degraded_loads"));
        let _ = counter!(phase_metric!(counter, "extract", "texts_synthesized"));
        let _ = counter!(phase_metric!(counter, "extract", "texts_missing"));
    }

    fn phase_name() -> &'static str {
        "extract"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "extract", "files_loaded"),
                metric_type: MetricType::Counter,
                help: "Input files loaded",
            },
            MetricDoc {
                name: phase_metric!(counter, "extract", "rows_read"),
                metric_type: MetricType::Counter,
                help: "Raw rows read from input files",
            },
            MetricDoc {
                name: phase_metric!(counter, "extract", "lines_skipped"),
                metric_type: MetricType::Counter,
                help: "Malformed lines skipped by lenient parsing",
            },
            MetricDoc {
                name: phase_metric!(counter, "extract", "degraded_loads"),
                metric_type: MetricType::Counter,
                help: "Loads that needed lenient parsing or lossy decoding",
            },
            MetricDoc {
                name: phase_metric!(counter, "extract", "texts_synthesized"),
                metric_type: MetricType::Counter,
                help: "Rows whose text was built from Top* columns",
            },
            MetricDoc {
                name: phase_metric!(counter, "extract", "texts_missing"),
                metric_type: MetricType::Counter,
                help: "Rows with no usable text",
            },
        ]
    }
}
