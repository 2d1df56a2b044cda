use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_DB_PATH, DEFAULT_INPUT_PATH, DEFAULT_LOG_DIR, DEFAULT_OUTPUT_DIR,
    DEFAULT_TABLE_NAME, DEFAULT_TOP_PHRASES, DEFAULT_TOP_TICKERS, ENV_PREFIX,
};
use crate::error::{EtlError, Result};

/// Explicit pipeline configuration.
///
/// Every field has a default, so an empty TOML file (or no file at all) is a
/// valid configuration:
///
/// | field         | default                    |
/// |---------------|----------------------------|
/// | `input_path`  | `stock_senti_analysis.csv` |
/// | `db_path`     | `etl_data.db`              |
/// | `output_dir`  | `plots`                    |
/// | `log_dir`     | `logs`                     |
/// | `table_name`  | `sentiments`               |
/// | `top_phrases` | 15                         |
/// | `top_tickers` | 12                         |
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EtlConfig {
    pub input_path: PathBuf,
    pub db_path: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub table_name: String,
    pub top_phrases: usize,
    pub top_tickers: usize,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            top_phrases: DEFAULT_TOP_PHRASES,
            top_tickers: DEFAULT_TOP_TICKERS,
        }
    }
}

impl EtlConfig {
    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EtlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from an optional TOML file, then apply `SENTIMENT_ETL_*`
    /// environment overrides (a `.env` file is honoured if present).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenv::dotenv();
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        base.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup. Split out from `load` so tests can
    /// feed a map instead of touching the process environment.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.trim().is_empty())
        };

        if let Some(v) = var("INPUT_PATH") {
            self.input_path = PathBuf::from(v);
        }
        if let Some(v) = var("DB_PATH") {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = var("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = var("LOG_DIR") {
            self.log_dir = PathBuf::from(v);
        }
        if let Some(v) = var("TABLE_NAME") {
            self.table_name = v;
        }
        if let Some(v) = var("TOP_PHRASES") {
            self.top_phrases = parse_count("TOP_PHRASES", &v)?;
        }
        if let Some(v) = var("TOP_TICKERS") {
            self.top_tickers = parse_count("TOP_TICKERS", &v)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// The table name is interpolated into DDL, so only identifier
    /// characters are accepted.
    pub fn validate(&self) -> Result<()> {
        let valid = !self.table_name.is_empty()
            && !self.table_name.starts_with(|c: char| c.is_ascii_digit())
            && self
                .table_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(EtlError::Config(format!(
                "Invalid table name '{}'",
                self.table_name
            )));
        }
        Ok(())
    }
}

fn parse_count(name: &str, value: &str) -> Result<usize> {
    value.trim().parse::<usize>().map_err(|e| {
        EtlError::Config(format!("{ENV_PREFIX}{name} must be a non-negative integer: {e}"))
    })
}
