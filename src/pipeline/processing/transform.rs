use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::pipeline::processing::label::LabelStrategy;
use crate::pipeline::processing::normalize::NormalizedFrame;
use crate::types::{CanonicalRecord, RecordDate};

const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%Y%m%d", "%d %b %Y", "%b %d, %Y"];

/// Lenient date coercion; anything unparseable becomes `None`.
/// An explicit offset is kept as given, not converted to UTC.
pub fn parse_date(raw: Option<&str>) -> Option<RecordDate> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.into());
    }
    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.into());
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.into());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(RecordDate::from);
        }
    }
    debug!("Unparseable date {:?} coerced to null", s);
    None
}

/// Build canonical records for every normalized row. Rows are not filtered
/// here; that is the reconciler's job.
pub fn to_canonical(frame: &NormalizedFrame) -> Vec<CanonicalRecord> {
    let strategy = LabelStrategy::select(frame.has_score, frame.has_label);
    debug!("Label strategy: {:?}", strategy);

    frame
        .rows
        .iter()
        .map(|row| {
            let resolution = strategy.resolve(row.label.as_deref(), row.sentiment_score.as_deref());
            CanonicalRecord::new(
                parse_date(row.date.as_deref()),
                row.ticker.clone(),
                row.text_original.clone(),
                resolution.label,
                resolution.score,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::normalize::{CandidateRow, TextSource};
    use crate::types::SentimentLabel;

    #[test]
    fn test_parse_common_date_layouts() {
        let local = |s: &str| parse_date(Some(s)).map(|d| d.local());
        let expected = NaiveDate::from_ymd_opt(2016, 7, 1).unwrap().and_hms_opt(0, 0, 0);
        assert_eq!(local("2016-07-01"), expected);
        assert_eq!(local("07/01/2016"), expected);
        assert_eq!(local("2016/07/01"), expected);
        assert_eq!(local("2016-07-01T00:00:00Z"), expected);
        assert_eq!(
            local("2016-07-01 13:45:00"),
            NaiveDate::from_ymd_opt(2016, 7, 1).unwrap().and_hms_opt(13, 45, 0)
        );
    }

    #[test]
    fn test_parse_keeps_offset_and_fraction() {
        let zoned = parse_date(Some("2020-01-01T23:30:00-05:00")).unwrap();
        assert_eq!(zoned.to_iso(), "2020-01-01T23:30:00-05:00");
        assert_eq!(zoned.offset().map(|o| o.local_minus_utc()), Some(-5 * 3600));

        let spaced = parse_date(Some("2020-01-01 23:30:00+0530")).unwrap();
        assert_eq!(spaced.to_iso(), "2020-01-01T23:30:00+05:30");

        let fractional = parse_date(Some("2020-01-01 10:00:00.250")).unwrap();
        assert_eq!(fractional.offset(), None);
        assert_eq!(fractional.to_iso(), "2020-01-01T10:00:00.250");
    }

    #[test]
    fn test_unparseable_date_is_null() {
        assert_eq!(parse_date(Some("yesterday")), None);
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(None), None);
    }

    #[test]
    fn test_to_canonical_uses_one_strategy_for_dataset() {
        let frame = NormalizedFrame {
            rows: vec![
                CandidateRow {
                    text_original: Some("a".into()),
                    label: Some("1".into()),
                    sentiment_score: Some("-0.5".into()),
                    ..Default::default()
                },
                CandidateRow {
                    text_original: Some("b".into()),
                    label: Some("1".into()),
                    sentiment_score: None,
                    ..Default::default()
                },
            ],
            text_source: TextSource::Column { name: "text".into() },
            has_label: true,
            has_score: true,
        };
        let records = to_canonical(&frame);
        assert_eq!(records[0].sentiment_label(), SentimentLabel::Negative);
        // null score under the score strategy stays neutral, label ignored
        assert_eq!(records[1].sentiment_label(), SentimentLabel::Neutral);
        assert_eq!(records[1].sentiment_score(), None);
    }
}
