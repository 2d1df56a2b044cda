pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod types;

pub use config::EtlConfig;
pub use error::{EtlError, Result};
pub use pipeline::{Pipeline, PipelineResult, PreparedBatch};
pub use types::{CanonicalRecord, RawTable, RecordDate, SentimentFrame, SentimentLabel};
