// Pipeline ingestion: reading input files into raw tables

pub mod loader;

pub use loader::{LoadReport, ParseMode, RecordLoader, SourceEncoding};
