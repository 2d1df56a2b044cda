use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct LoadMetrics;

impl LoadMetrics {
    pub fn record_append_success(rows: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "load", "batches_appended")).increment(1);
        ::metrics::counter!(phase_metric!(counter, "load", "rows_appended")).increment(rows as u64);
        ::metrics::histogram!(phase_metric!(histogram, "load", "duration_seconds"))
            .record(duration_secs);
    }

    pub fn record_append_error() {
        ::metrics::counter!(phase_metric!(counter, "load", "errors")).increment(1);
    }
}

impl PhaseMetrics for LoadMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "load", "batches_appended"));
        let _ = counter!(phase_metric!(counter, "load", "rows_appended"));
        let _ = counter!(phase_metric!(counter, "load", "errors"));
        let _ = histogram!(phase_metric!(histogram, "load", "duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "load"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "load", "batches_appended"),
                metric_type: MetricType::Counter,
                help: "Batches appended to the store",
            },
            MetricDoc {
                name: phase_metric!(counter, "load", "rows_appended"),
                metric_type: MetricType::Counter,
                help: "Rows appended to the store",
            },
            MetricDoc {
                name: phase_metric!(counter, "load", "errors"),
                metric_type: MetricType::Counter,
                help: "Failed append attempts",
            },
            MetricDoc {
                name: phase_metric!(histogram, "load", "duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Time spent appending a batch",
            },
        ]
    }
}
