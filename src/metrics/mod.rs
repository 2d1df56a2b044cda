//! Metrics for the ETL pipeline
//!
//! Each pipeline phase owns a small struct of recording functions built on the
//! `metrics` facade. No recorder is installed here; embedding applications
//! choose their own exporter, and without one the macros are no-ops.

pub mod extract;
pub mod load;
pub mod transform;

pub use extract::ExtractMetrics;
pub use load::LoadMetrics;
pub use transform::TransformMetrics;

use std::collections::HashMap;
use tracing::{debug, warn};

/// Trait for phase-specific metrics collections
pub trait PhaseMetrics {
    /// Register all metrics for this phase
    fn register_metrics();

    /// Get the phase name for prefixing metrics
    fn phase_name() -> &'static str;

    /// Get documentation for all metrics in this phase
    fn metrics_documentation() -> Vec<MetricDoc>;
}

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

/// Naming convention: etl_{phase}_{metric_name}[_total]
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("etl_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("etl_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;

/// Register every phase and return the number of distinct metric names.
/// Conflicting names are logged, not fatal.
pub fn register_all_metrics() -> usize {
    let mut all_metrics = HashMap::new();
    register_phase_metrics::<ExtractMetrics>(&mut all_metrics);
    register_phase_metrics::<TransformMetrics>(&mut all_metrics);
    register_phase_metrics::<LoadMetrics>(&mut all_metrics);
    debug!("Registered {} pipeline metrics", all_metrics.len());
    all_metrics.len()
}

fn register_phase_metrics<T: PhaseMetrics>(all_metrics: &mut HashMap<&'static str, MetricDoc>) {
    T::register_metrics();
    for doc in T::metrics_documentation() {
        if all_metrics.contains_key(doc.name) {
            warn!(
                "Metric name conflict: '{}' registered again by phase '{}'",
                doc.name,
                T::phase_name()
            );
        } else {
            all_metrics.insert(doc.name, doc);
        }
    }
}
