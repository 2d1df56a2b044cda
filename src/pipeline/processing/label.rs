use serde::Serialize;

use crate::constants::{NEGATIVE_SYNONYMS, NEGATIVE_THRESHOLD, POSITIVE_SYNONYMS, POSITIVE_THRESHOLD};
use crate::types::SentimentLabel;

/// Which signal a dataset's labels are derived from. Exactly one strategy
/// applies per dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStrategy {
    /// Threshold a numeric score column
    Score,
    /// Map a categorical/binary label column
    Label,
    /// No signal: everything is neutral
    Neutral,
}

impl LabelStrategy {
    /// The score column takes precedence over the label column.
    pub fn select(has_score: bool, has_label: bool) -> Self {
        if has_score {
            LabelStrategy::Score
        } else if has_label {
            LabelStrategy::Label
        } else {
            LabelStrategy::Neutral
        }
    }

    pub fn resolve(&self, label: Option<&str>, score: Option<&str>) -> Resolution {
        match self {
            LabelStrategy::Score => {
                let score = parse_score(score);
                Resolution {
                    label: label_from_score(score),
                    score,
                }
            }
            LabelStrategy::Label => Resolution {
                label: map_label_value(label),
                score: None,
            },
            LabelStrategy::Neutral => Resolution {
                label: SentimentLabel::Neutral,
                score: None,
            },
        }
    }
}

/// A derived label with the score it came from, if any
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub label: SentimentLabel,
    pub score: Option<f64>,
}

/// Coerce a raw cell to a finite number; anything else is null.
pub fn parse_score(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

pub fn label_from_score(score: Option<f64>) -> SentimentLabel {
    match score {
        Some(s) if s > POSITIVE_THRESHOLD => SentimentLabel::Positive,
        Some(s) if s < NEGATIVE_THRESHOLD => SentimentLabel::Negative,
        _ => SentimentLabel::Neutral,
    }
}

/// Binary 1/0 or a known synonym; unknown values are neutral.
pub fn map_label_value(raw: Option<&str>) -> SentimentLabel {
    let Some(raw) = raw else {
        return SentimentLabel::Neutral;
    };
    let txt = raw.trim().to_lowercase();

    if let Ok(n) = txt.parse::<f64>() {
        if n == 1.0 {
            return SentimentLabel::Positive;
        }
        if n == 0.0 {
            return SentimentLabel::Negative;
        }
    }

    if POSITIVE_SYNONYMS.contains(&txt.as_str()) {
        SentimentLabel::Positive
    } else if NEGATIVE_SYNONYMS.contains(&txt.as_str()) {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_takes_precedence() {
        assert_eq!(LabelStrategy::select(true, true), LabelStrategy::Score);
        assert_eq!(LabelStrategy::select(false, true), LabelStrategy::Label);
        assert_eq!(LabelStrategy::select(false, false), LabelStrategy::Neutral);
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        assert_eq!(label_from_score(Some(0.5)), SentimentLabel::Positive);
        assert_eq!(label_from_score(Some(0.2)), SentimentLabel::Neutral);
        assert_eq!(label_from_score(Some(-0.2)), SentimentLabel::Neutral);
        assert_eq!(label_from_score(Some(-0.21)), SentimentLabel::Negative);
        assert_eq!(label_from_score(None), SentimentLabel::Neutral);
    }

    #[test]
    fn test_non_numeric_score_is_null_and_neutral() {
        let r = LabelStrategy::Score.resolve(Some("positive"), Some("n/a"));
        assert_eq!(r, Resolution { label: SentimentLabel::Neutral, score: None });
        assert_eq!(parse_score(Some("NaN")), None);
        assert_eq!(parse_score(Some(" -0.75 ")), Some(-0.75));
    }

    #[test]
    fn test_score_path_ignores_label_column() {
        let r = LabelStrategy::Score.resolve(Some("1"), Some("-0.9"));
        assert_eq!(r.label, SentimentLabel::Negative);
        assert_eq!(r.score, Some(-0.9));
    }

    #[test]
    fn test_label_mapping() {
        assert_eq!(map_label_value(Some("1")), SentimentLabel::Positive);
        assert_eq!(map_label_value(Some("1.0")), SentimentLabel::Positive);
        assert_eq!(map_label_value(Some("0")), SentimentLabel::Negative);
        assert_eq!(map_label_value(Some(" Positivo ")), SentimentLabel::Positive);
        assert_eq!(map_label_value(Some("NEG")), SentimentLabel::Negative);
        assert_eq!(map_label_value(Some("negativa")), SentimentLabel::Negative);
        assert_eq!(map_label_value(Some("2")), SentimentLabel::Neutral);
        assert_eq!(map_label_value(Some("meh")), SentimentLabel::Neutral);
        assert_eq!(map_label_value(None), SentimentLabel::Neutral);
    }

    #[test]
    fn test_label_path_never_has_score() {
        let r = LabelStrategy::Label.resolve(Some("1"), Some("0.9"));
        assert_eq!(r, Resolution { label: SentimentLabel::Positive, score: None });
    }
}
