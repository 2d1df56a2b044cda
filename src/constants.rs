/// Canonical column names shared by the normalizer, the store and reports.
pub const COL_DATE: &str = "date";
pub const COL_TICKER: &str = "ticker";
pub const COL_TEXT_ORIGINAL: &str = "text_original";
pub const COL_CLEANED_TEXT: &str = "cleaned_text";
pub const COL_SENTIMENT_LABEL: &str = "sentiment_label";
pub const COL_SENTIMENT_SCORE: &str = "sentiment_score";

/// The six canonical columns, in storage order.
pub const CANONICAL_COLUMNS: [&str; 6] = [
    COL_DATE,
    COL_TICKER,
    COL_TEXT_ORIGINAL,
    COL_CLEANED_TEXT,
    COL_SENTIMENT_LABEL,
    COL_SENTIMENT_SCORE,
];

// Input column aliases, highest priority first. Matched case-insensitively.
pub const DATE_ALIASES: &[&str] = &["date", "day"];
pub const TEXT_ALIASES: &[&str] = &["text", "sentence"];
pub const LABEL_ALIASES: &[&str] = &["label"];
pub const SCORE_ALIASES: &[&str] = &["sentiment_score", "score"];
pub const TICKER_ALIASES: &[&str] = &["ticker"];

/// Prefix of ranked snippet columns (Top1, Top2, ...) used to synthesize text.
pub const TOP_COLUMN_PREFIX: &str = "top";

/// Score above which a row is positive.
pub const POSITIVE_THRESHOLD: f64 = 0.2;
/// Score below which a row is negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.2;

pub const POSITIVE_SYNONYMS: &[&str] = &["positive", "pos", "positivo", "positiva"];
pub const NEGATIVE_SYNONYMS: &[&str] = &["negative", "neg", "negativo", "negativa"];

pub const DEFAULT_TABLE_NAME: &str = "sentiments";
pub const DEFAULT_INPUT_PATH: &str = "stock_senti_analysis.csv";
pub const DEFAULT_DB_PATH: &str = "etl_data.db";
pub const DEFAULT_OUTPUT_DIR: &str = "plots";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_TOP_PHRASES: usize = 15;
pub const DEFAULT_TOP_TICKERS: usize = 12;

pub const SUMMARY_FILE_NAME: &str = "sentiment_summary.json";

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "SENTIMENT_ETL_";
