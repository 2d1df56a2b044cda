use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::constants::CANONICAL_COLUMNS;
use crate::pipeline::processing::clean::clean_text;

/// Rows exactly as read from the input file: a header plus untyped string
/// cells. Blank cells are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first header equal to `name`, ignoring case and
    /// surrounding whitespace.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    /// First column matching any alias, in alias priority order.
    pub fn find_column(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|alias| self.column_index(alias))
    }

    /// Cell at (`row`, `col`); rows shorter than the header read as blank.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// The three canonical sentiment classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Neutral,
        SentimentLabel::Negative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed record timestamp. The UTC offset is kept only when the input
/// carried one; naive inputs stay naive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordDate {
    Naive(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl RecordDate {
    /// Wall-clock time as written in the input, without shifting to UTC.
    pub fn local(&self) -> NaiveDateTime {
        match self {
            RecordDate::Naive(d) => *d,
            RecordDate::Zoned(dt) => dt.naive_local(),
        }
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        match self {
            RecordDate::Naive(_) => None,
            RecordDate::Zoned(dt) => Some(*dt.offset()),
        }
    }

    /// ISO-8601 with fractional seconds when present and the offset when known.
    pub fn to_iso(&self) -> String {
        match self {
            RecordDate::Naive(d) => d.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            RecordDate::Zoned(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f%:z").to_string(),
        }
    }
}

impl From<NaiveDateTime> for RecordDate {
    fn from(d: NaiveDateTime) -> Self {
        RecordDate::Naive(d)
    }
}

impl From<DateTime<FixedOffset>> for RecordDate {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        RecordDate::Zoned(dt)
    }
}

impl fmt::Display for RecordDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso())
    }
}

impl Serialize for RecordDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso())
    }
}

/// The normalized six-field row shape consumed by storage and reporting.
///
/// Fields are private: `cleaned_text` is always derived from
/// `text_original` at construction and records never change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    date: Option<RecordDate>,
    ticker: Option<String>,
    text_original: Option<String>,
    cleaned_text: String,
    sentiment_label: SentimentLabel,
    sentiment_score: Option<f64>,
}

impl CanonicalRecord {
    pub fn new(
        date: Option<RecordDate>,
        ticker: Option<String>,
        text_original: Option<String>,
        sentiment_label: SentimentLabel,
        sentiment_score: Option<f64>,
    ) -> Self {
        let cleaned_text = clean_text(text_original.as_deref());
        Self {
            date,
            ticker,
            text_original,
            cleaned_text,
            sentiment_label,
            sentiment_score,
        }
    }

    pub fn date(&self) -> Option<RecordDate> {
        self.date
    }

    /// ISO-8601 rendering used by the store, `None` when the date is missing.
    pub fn date_iso(&self) -> Option<String> {
        self.date.as_ref().map(RecordDate::to_iso)
    }

    pub fn ticker(&self) -> Option<&str> {
        self.ticker.as_deref()
    }

    pub fn text_original(&self) -> Option<&str> {
        self.text_original.as_deref()
    }

    pub fn cleaned_text(&self) -> &str {
        &self.cleaned_text
    }

    pub fn sentiment_label(&self) -> SentimentLabel {
        self.sentiment_label
    }

    pub fn sentiment_score(&self) -> Option<f64> {
        self.sentiment_score
    }
}

/// Finalized, fully materialized batch handed to the sink and to reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SentimentFrame {
    records: Vec<CanonicalRecord>,
}

impl SentimentFrame {
    pub fn new(records: Vec<CanonicalRecord>) -> Self {
        Self { records }
    }

    pub fn columns() -> [&'static str; 6] {
        CANONICAL_COLUMNS
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<CanonicalRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a SentimentFrame {
    type Item = &'a CanonicalRecord;
    type IntoIter = std::slice::Iter<'a, CanonicalRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let table = RawTable::new(
            vec!["Date".into(), " SENTENCE ".into(), "Label".into()],
            vec![vec!["2020-01-01".into(), "hi".into()]],
        );
        assert_eq!(table.column_index("date"), Some(0));
        assert_eq!(table.find_column(&["text", "sentence"]), Some(1));
        assert_eq!(table.find_column(&["score"]), None);
        // short row reads as blank
        assert_eq!(table.cell(0, 2), "");
    }

    #[test]
    fn test_cleaned_text_derived_on_construction() {
        let record = CanonicalRecord::new(
            None,
            None,
            Some("Hello, @bob!".to_string()),
            SentimentLabel::Neutral,
            None,
        );
        assert_eq!(record.cleaned_text(), "Hello");
    }

    #[test]
    fn test_date_iso_format() {
        let date = NaiveDate::from_ymd_opt(2016, 7, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let record = CanonicalRecord::new(
            Some(date.into()),
            None,
            Some("x".into()),
            SentimentLabel::Positive,
            None,
        );
        assert_eq!(record.date_iso().as_deref(), Some("2016-07-01T00:00:00"));
    }

    #[test]
    fn test_date_iso_keeps_fraction_and_offset() {
        let naive = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_milli_opt(10, 0, 0, 250)
            .unwrap();
        assert_eq!(RecordDate::from(naive).to_iso(), "2020-01-01T10:00:00.250");

        let zoned = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2020, 1, 1, 23, 30, 0)
            .unwrap();
        let date = RecordDate::from(zoned);
        assert_eq!(date.to_iso(), "2020-01-01T23:30:00-05:00");
        // wall clock is not shifted to UTC
        assert_eq!(date.local().date(), NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"2020-01-01T23:30:00-05:00\"");
    }

    #[test]
    fn test_label_serializes_lowercase() {
        let json = serde_json::to_string(&SentimentLabel::Negative).unwrap();
        assert_eq!(json, "\"negative\"");
        assert_eq!(SentimentLabel::Positive.to_string(), "positive");
    }
}
