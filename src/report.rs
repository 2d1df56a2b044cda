//! Reporting collaborator: aggregates the finalized frame into summary
//! tables and writes them as JSON.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::EtlConfig;
use crate::constants::SUMMARY_FILE_NAME;
use crate::error::{EtlError, Result};
use crate::types::{SentimentFrame, SentimentLabel};

const HISTOGRAM_BINS: usize = 10;
const HISTOGRAM_MIN: f64 = -1.0;
const HISTOGRAM_MAX: f64 = 1.0;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Consumes a finalized frame. Implementations must not need to mutate it.
pub trait Reporter {
    /// Check that the output location is usable. Called before anything is
    /// persisted.
    fn prepare(&self) -> Result<()> {
        Ok(())
    }

    fn report(&self, frame: &SentimentFrame) -> Result<SentimentSummary>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelShare {
    pub label: SentimentLabel,
    pub count: usize,
    pub share: f64,
}

/// Per-label counts for one bucket (a day or a weekday)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LabelCounts {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl LabelCounts {
    fn add(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Negative => self.negative += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }

    /// Proportions (positive, neutral, negative); all zero for an empty bucket
    pub fn proportions(&self) -> (f64, f64, f64) {
        let total = self.total();
        if total == 0 {
            return (0.0, 0.0, 0.0);
        }
        let t = total as f64;
        (
            self.positive as f64 / t,
            self.neutral as f64 / t,
            self.negative as f64 / t,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySentiment {
    pub date: NaiveDate,
    pub counts: LabelCounts,
    pub proportions: (f64, f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdaySentiment {
    pub weekday: String,
    pub proportions: (f64, f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountEntry {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub histogram: Vec<HistogramBin>,
}

/// Everything the reporter derives from a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentSummary {
    pub total_rows: usize,
    pub labels: Vec<LabelShare>,
    pub daily: Vec<DailySentiment>,
    pub weekday: Vec<WeekdaySentiment>,
    pub top_tickers: Vec<CountEntry>,
    pub top_phrases: Vec<CountEntry>,
    pub scores: Option<ScoreStats>,
}

impl SentimentSummary {
    pub fn from_frame(frame: &SentimentFrame, top_tickers: usize, top_phrases: usize) -> Self {
        Self {
            total_rows: frame.len(),
            labels: label_shares(frame),
            daily: daily_sentiment(frame),
            weekday: weekday_sentiment(frame),
            top_tickers: top_counts(frame.iter().filter_map(|r| r.ticker()), top_tickers),
            top_phrases: top_counts(frame.iter().map(|r| r.cleaned_text()), top_phrases),
            scores: score_stats(frame),
        }
    }
}

fn label_shares(frame: &SentimentFrame) -> Vec<LabelShare> {
    let mut counts = LabelCounts::default();
    for record in frame {
        counts.add(record.sentiment_label());
    }
    let (p, n, neg) = counts.proportions();
    vec![
        LabelShare { label: SentimentLabel::Positive, count: counts.positive, share: p },
        LabelShare { label: SentimentLabel::Neutral, count: counts.neutral, share: n },
        LabelShare { label: SentimentLabel::Negative, count: counts.negative, share: neg },
    ]
}

fn daily_sentiment(frame: &SentimentFrame) -> Vec<DailySentiment> {
    let mut by_day: BTreeMap<NaiveDate, LabelCounts> = BTreeMap::new();
    for record in frame {
        if let Some(date) = record.date() {
            by_day.entry(date.local().date()).or_default().add(record.sentiment_label());
        }
    }
    by_day
        .into_iter()
        .map(|(date, counts)| DailySentiment {
            date,
            counts,
            proportions: counts.proportions(),
        })
        .collect()
}

fn weekday_sentiment(frame: &SentimentFrame) -> Vec<WeekdaySentiment> {
    let mut by_weekday: HashMap<Weekday, LabelCounts> = HashMap::new();
    for record in frame {
        if let Some(date) = record.date() {
            by_weekday.entry(date.local().weekday()).or_default().add(record.sentiment_label());
        }
    }
    if by_weekday.is_empty() {
        return Vec::new();
    }
    WEEKDAYS
        .iter()
        .map(|day| WeekdaySentiment {
            weekday: weekday_name(*day).to_string(),
            proportions: by_weekday.get(day).copied().unwrap_or_default().proportions(),
        })
        .collect()
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Most frequent values, ties broken alphabetically.
fn top_counts<'a>(values: impl Iterator<Item = &'a str>, n: usize) -> Vec<CountEntry> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values.filter(|v| !v.trim().is_empty()) {
        *counts.entry(v).or_default() += 1;
    }
    let mut entries: Vec<CountEntry> = counts
        .into_iter()
        .map(|(value, count)| CountEntry { value: value.to_string(), count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    entries.truncate(n);
    entries
}

fn score_stats(frame: &SentimentFrame) -> Option<ScoreStats> {
    let scores: Vec<f64> = frame.iter().filter_map(|r| r.sentiment_score()).collect();
    if scores.is_empty() {
        return None;
    }
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;

    let width = (HISTOGRAM_MAX - HISTOGRAM_MIN) / HISTOGRAM_BINS as f64;
    let mut histogram: Vec<HistogramBin> = (0..HISTOGRAM_BINS)
        .map(|i| HistogramBin {
            lower: HISTOGRAM_MIN + width * i as f64,
            upper: HISTOGRAM_MIN + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for s in &scores {
        // out-of-range scores land in the edge bins
        let idx = ((s.clamp(HISTOGRAM_MIN, HISTOGRAM_MAX) - HISTOGRAM_MIN) / width) as usize;
        histogram[idx.min(HISTOGRAM_BINS - 1)].count += 1;
    }

    Some(ScoreStats {
        count: scores.len(),
        min,
        max,
        mean,
        histogram,
    })
}

/// Default reporter: writes `sentiment_summary.json` into the output directory.
pub struct SummaryReporter {
    output_dir: PathBuf,
    top_tickers: usize,
    top_phrases: usize,
}

impl SummaryReporter {
    pub fn new<P: AsRef<Path>>(output_dir: P, top_tickers: usize, top_phrases: usize) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            top_tickers,
            top_phrases,
        }
    }

    pub fn from_config(config: &EtlConfig) -> Self {
        Self::new(&config.output_dir, config.top_tickers, config.top_phrases)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(SUMMARY_FILE_NAME)
    }
}

impl Reporter for SummaryReporter {
    fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir).map_err(|e| {
            EtlError::Report(format!(
                "cannot create output directory '{}': {}",
                self.output_dir.display(),
                e
            ))
        })?;
        let metadata = fs::metadata(&self.output_dir)?;
        if metadata.permissions().readonly() {
            return Err(EtlError::Report(format!(
                "output directory '{}' is read-only",
                self.output_dir.display()
            )));
        }
        Ok(())
    }

    fn report(&self, frame: &SentimentFrame) -> Result<SentimentSummary> {
        let summary = SentimentSummary::from_frame(frame, self.top_tickers, self.top_phrases);

        self.prepare()?;
        let path = self.summary_path();
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(&path, json)?;
        info!("📊 Wrote summary for {} rows to {}", summary.total_rows, path.display());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CanonicalRecord;
    use tempfile::tempdir;

    fn rec(day: Option<(i32, u32, u32)>, ticker: Option<&str>, text: &str, label: SentimentLabel, score: Option<f64>) -> CanonicalRecord {
        let date = day
            .and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(Into::into);
        CanonicalRecord::new(date, ticker.map(str::to_owned), Some(text.to_string()), label, score)
    }

    fn frame() -> SentimentFrame {
        SentimentFrame::new(vec![
            // 2024-01-01 is a Monday
            rec(Some((2024, 1, 1)), Some("AAPL"), "up", SentimentLabel::Positive, Some(0.9)),
            rec(Some((2024, 1, 1)), Some("AAPL"), "down", SentimentLabel::Negative, Some(-0.9)),
            rec(Some((2024, 1, 2)), Some("MSFT"), "flat", SentimentLabel::Neutral, Some(0.0)),
            rec(None, None, "up!", SentimentLabel::Positive, Some(1.0)),
        ])
    }

    #[test]
    fn test_label_shares() {
        let summary = SentimentSummary::from_frame(&frame(), 12, 15);
        assert_eq!(summary.total_rows, 4);
        assert_eq!(summary.labels[0].count, 2);
        assert!((summary.labels[0].share - 0.5).abs() < 1e-9);
        assert_eq!(summary.labels[2].label, SentimentLabel::Negative);
    }

    #[test]
    fn test_daily_and_weekday_ignore_undated_rows() {
        let summary = SentimentSummary::from_frame(&frame(), 12, 15);
        assert_eq!(summary.daily.len(), 2);
        assert_eq!(summary.daily[0].counts.total(), 2);
        assert_eq!(summary.weekday.len(), 7);
        assert_eq!(summary.weekday[0].weekday, "Monday");
        assert_eq!(summary.weekday[0].proportions, (0.5, 0.0, 0.5));
        assert_eq!(summary.weekday[6].proportions, (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_top_counts_and_phrases() {
        let summary = SentimentSummary::from_frame(&frame(), 1, 15);
        assert_eq!(summary.top_tickers, vec![CountEntry { value: "AAPL".into(), count: 2 }]);
        // "up" and "up!" both clean to "up"
        assert_eq!(summary.top_phrases[0], CountEntry { value: "up".into(), count: 2 });
    }

    #[test]
    fn test_score_histogram() {
        let stats = SentimentSummary::from_frame(&frame(), 12, 15).scores.unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.min, -0.9);
        assert_eq!(stats.max, 1.0);
        assert_eq!(stats.histogram.iter().map(|b| b.count).sum::<usize>(), 4);
        // 1.0 sits on the upper edge and belongs to the last bin
        assert_eq!(stats.histogram[9].count, 2);
    }

    #[test]
    fn test_empty_frame_reports_without_error() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let reporter = SummaryReporter::new(dir.path().join("plots"), 12, 15);
        let summary = reporter.report(&SentimentFrame::default())?;
        assert_eq!(summary.total_rows, 0);
        assert!(summary.scores.is_none());
        assert!(summary.weekday.is_empty());
        assert!(reporter.summary_path().exists());
        Ok(())
    }

    #[test]
    fn test_prepare_rejects_output_path_that_is_a_file() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let blocker = dir.path().join("plots");
        fs::write(&blocker, b"not a directory")?;

        let reporter = SummaryReporter::new(&blocker, 12, 15);
        let err = reporter.prepare().unwrap_err();
        assert!(matches!(err, EtlError::Report(_)));
        Ok(())
    }

    #[test]
    fn test_zoned_dates_bucket_by_wall_clock_day() {
        use chrono::{FixedOffset, TimeZone};

        let late_evening = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2020, 1, 1, 23, 30, 0)
            .unwrap();
        let morning = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        let frame = SentimentFrame::new(vec![
            CanonicalRecord::new(Some(late_evening.into()), None, Some("a".into()), SentimentLabel::Positive, None),
            CanonicalRecord::new(Some(morning.into()), None, Some("b".into()), SentimentLabel::Negative, None),
        ]);

        let summary = SentimentSummary::from_frame(&frame, 12, 15);
        assert_eq!(summary.daily.len(), 1);
        assert_eq!(summary.daily[0].date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(summary.daily[0].counts.total(), 2);
    }
}
