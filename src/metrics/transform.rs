use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct TransformMetrics;

impl TransformMetrics {
    pub fn record_reconcile(input: usize, duplicates: usize, empty: usize, kept: usize) {
        ::metrics::counter!(phase_metric!(counter, "transform", "rows_in")).increment(input as u64);
        ::metrics::counter!(phase_metric!(counter, "transform", "duplicates_dropped"))
            .increment(duplicates as u64);
        ::metrics::counter!(phase_metric!(counter, "transform", "empty_dropped"))
            .increment(empty as u64);
        ::metrics::histogram!(phase_metric!(histogram, "transform", "rows_kept")).record(kept as f64);
    }

    pub fn record_duration(duration_secs: f64) {
        ::metrics::histogram!(phase_metric!(histogram, "transform", "duration_seconds"))
            .record(duration_secs);
    }
}

impl PhaseMetrics for TransformMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "transform", "rows_in"));
        let _ = counter!(phase_metric!(counter, "transform", "duplicates_dropped"));
        let _ = counter!(phase_metric!(counter, "transform", "empty_dropped"));
        let _ = histogram!(phase_metric!(histogram, "transform", "rows_kept"));
        let _ = histogram!(phase_metric!(histogram, "transform", "duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "transform"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "transform", "rows_in"),
                metric_type: MetricType::Counter,
                help: "Candidate rows entering reconciliation",
            },
            MetricDoc {
                name: phase_metric!(counter, "transform", "duplicates_dropped"),
                metric_type: MetricType::Counter,
                help: "Rows dropped as duplicate text within a batch",
            },
            MetricDoc {
                name: phase_metric!(counter, "transform", "empty_dropped"),
                metric_type: MetricType::Counter,
                help: "Rows dropped because cleaned text was empty",
            },
            MetricDoc {
                name: phase_metric!(histogram, "transform", "rows_kept"),
                metric_type: MetricType::Histogram,
                help: "Rows kept per batch",
            },
            MetricDoc {
                name: phase_metric!(histogram, "transform", "duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Transform stage duration",
            },
        ]
    }
}
