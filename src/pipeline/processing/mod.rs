// Pipeline processing: schema normalization, cleaning, labeling and reconciliation

pub mod clean;
pub mod label;
pub mod normalize;
pub mod reconcile;
pub mod transform;

pub use clean::clean_text;
pub use label::{LabelStrategy, Resolution};
pub use normalize::{CandidateRow, NormalizedFrame, SchemaNormalizer, TextSource};
pub use reconcile::{reconcile, ReconcileReport};
pub use transform::{parse_date, to_canonical};
