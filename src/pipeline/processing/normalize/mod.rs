use serde::Serialize;
use tracing::{debug, warn};

use crate::constants::{
    DATE_ALIASES, LABEL_ALIASES, SCORE_ALIASES, TEXT_ALIASES, TICKER_ALIASES, TOP_COLUMN_PREFIX,
};
use crate::metrics::ExtractMetrics;
use crate::types::RawTable;

/// Where `text_original` came from for a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextSource {
    /// A single `text`/`sentence` column, by its original header
    Column { name: String },
    /// Concatenation of ranked `Top*` snippet columns
    TopColumns { count: usize },
    /// No usable text-bearing column at all
    Missing,
}

/// One input row mapped onto canonical names, values still untyped.
/// Blank cells become `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CandidateRow {
    pub date: Option<String>,
    pub ticker: Option<String>,
    /// `None` is the explicit missing marker, never `Some("")`
    pub text_original: Option<String>,
    pub label: Option<String>,
    pub sentiment_score: Option<String>,
}

/// Output of schema normalization for a whole dataset
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFrame {
    pub rows: Vec<CandidateRow>,
    pub text_source: TextSource,
    /// A `label` column existed in the input
    pub has_label: bool,
    /// A `sentiment_score`/`score` column existed in the input
    pub has_score: bool,
}

impl NormalizedFrame {
    pub fn missing_text_count(&self) -> usize {
        self.rows.iter().filter(|r| r.text_original.is_none()).count()
    }
}

/// Maps heterogeneous input headers onto the canonical column set.
pub struct SchemaNormalizer;

impl SchemaNormalizer {
    pub fn normalize(table: &RawTable) -> NormalizedFrame {
        let date_col = table.find_column(DATE_ALIASES);
        let ticker_col = table.find_column(TICKER_ALIASES);
        let label_col = table.find_column(LABEL_ALIASES);
        let score_col = table.find_column(SCORE_ALIASES);

        // A text column only counts if at least one cell has content
        let text_col = table
            .find_column(TEXT_ALIASES)
            .filter(|&col| (0..table.len()).any(|row| !table.cell(row, col).trim().is_empty()));

        let top_cols: Vec<usize> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.trim().to_lowercase().starts_with(TOP_COLUMN_PREFIX))
            .map(|(i, _)| i)
            .collect();

        let text_source = match text_col {
            Some(col) => TextSource::Column {
                name: table.headers[col].clone(),
            },
            None if !top_cols.is_empty() => TextSource::TopColumns {
                count: top_cols.len(),
            },
            None => TextSource::Missing,
        };
        debug!(
            "Column mapping: date={:?} ticker={:?} label={:?} score={:?} text={:?}",
            date_col, ticker_col, label_col, score_col, text_source
        );

        let rows: Vec<CandidateRow> = (0..table.len())
            .map(|row| {
                let text_original = match text_col {
                    Some(col) => non_blank(table.cell(row, col)),
                    None => join_top_columns(table, row, &top_cols),
                };
                CandidateRow {
                    date: date_col.and_then(|c| non_blank(table.cell(row, c))),
                    ticker: ticker_col.and_then(|c| non_blank(table.cell(row, c))),
                    text_original,
                    label: label_col.and_then(|c| non_blank(table.cell(row, c))),
                    sentiment_score: score_col.and_then(|c| non_blank(table.cell(row, c))),
                }
            })
            .collect();

        let frame = NormalizedFrame {
            rows,
            text_source,
            has_label: label_col.is_some(),
            has_score: score_col.is_some(),
        };

        let missing = frame.missing_text_count();
        let synthesized = match frame.text_source {
            TextSource::TopColumns { .. } => frame.rows.len() - missing,
            _ => 0,
        };
        ExtractMetrics::record_text_source(synthesized, missing);
        if frame.text_source == TextSource::Missing && !frame.rows.is_empty() {
            warn!(
                "No usable text column or Top* columns; {} rows have no text",
                frame.rows.len()
            );
        }

        frame
    }
}

fn non_blank(cell: &str) -> Option<String> {
    if cell.trim().is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

/// Join trimmed, non-empty Top* cells with single spaces, in column order.
fn join_top_columns(table: &RawTable, row: usize, top_cols: &[usize]) -> Option<String> {
    let joined = top_cols
        .iter()
        .map(|&col| table.cell(row, col).trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}
