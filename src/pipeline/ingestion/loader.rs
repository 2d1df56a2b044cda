use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use crate::error::{EtlError, Result};
use crate::metrics::ExtractMetrics;
use crate::types::RawTable;

/// Character encodings tried by the loader, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceEncoding {
    /// UTF-8 without a byte order mark
    Utf8,
    /// UTF-8 starting with a byte order mark
    Utf8Bom,
    Latin1,
    Windows1252,
}

impl SourceEncoding {
    pub const PRIORITY: [SourceEncoding; 4] = [
        SourceEncoding::Utf8,
        SourceEncoding::Utf8Bom,
        SourceEncoding::Latin1,
        SourceEncoding::Windows1252,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SourceEncoding::Utf8 => "utf-8",
            SourceEncoding::Utf8Bom => "utf-8-sig",
            SourceEncoding::Latin1 => "latin-1",
            SourceEncoding::Windows1252 => "windows-1252",
        }
    }

    /// Strict decode; `None` when the bytes are not valid in this encoding.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        const BOM: &[u8] = b"\xEF\xBB\xBF";
        match self {
            SourceEncoding::Utf8 => {
                if bytes.starts_with(BOM) {
                    return None;
                }
                std::str::from_utf8(bytes).ok().map(str::to_owned)
            }
            SourceEncoding::Utf8Bom => {
                let rest = bytes.strip_prefix(BOM)?;
                std::str::from_utf8(rest).ok().map(str::to_owned)
            }
            // ISO-8859-1 maps every byte to the code point of the same value
            SourceEncoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            SourceEncoding::Windows1252 => encoding_rs::WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|cow| cow.into_owned()),
        }
    }
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the winning table was parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    Strict,
    /// Malformed lines were skipped
    Lenient,
    /// Every encoding failed; bytes were decoded with replacement characters
    LossyFallback,
}

/// What the loader did to produce the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    /// `None` for the lossy fallback path
    pub encoding: Option<SourceEncoding>,
    pub mode: ParseMode,
    pub rows_read: usize,
    pub skipped_lines: usize,
    pub source_sha256: String,
}

impl LoadReport {
    /// True when rows may have been lost or characters replaced.
    pub fn degraded(&self) -> bool {
        self.mode != ParseMode::Strict
    }
}

/// Why a parse attempt failed.
#[derive(Debug)]
enum ParseFailure {
    /// A row did not fit the header; worth retrying leniently
    Malformed(String),
    Other(String),
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFailure::Malformed(m) => write!(f, "malformed row: {m}"),
            ParseFailure::Other(m) => f.write_str(m),
        }
    }
}

/// Reads a delimited file into a [`RawTable`], recovering from encoding and
/// row-shape problems instead of failing.
pub struct RecordLoader;

impl RecordLoader {
    /// Read and parse the file at `path`. The only error is an unreadable file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<(RawTable, LoadReport)> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| EtlError::Ingest {
            path: path.to_path_buf(),
            source,
        })?;
        info!("📥 Read {} bytes from {}", bytes.len(), path.display());
        Ok(Self::load_bytes(&bytes))
    }

    /// Parse in-memory bytes using the encoding fallback chain. Never fails.
    pub fn load_bytes(bytes: &[u8]) -> (RawTable, LoadReport) {
        let source_sha256 = hex::encode(Sha256::digest(bytes));

        for encoding in SourceEncoding::PRIORITY {
            let Some(text) = encoding.decode(bytes) else {
                debug!("Input is not valid {}", encoding);
                continue;
            };

            let attempt = match parse_strict(&text) {
                Ok(table) => Some((table, ParseMode::Strict, 0)),
                Err(ParseFailure::Malformed(reason)) => {
                    debug!("Strict parse with {} failed ({}); retrying leniently", encoding, reason);
                    match parse_lenient(&text) {
                        Ok((table, skipped)) => Some((table, ParseMode::Lenient, skipped)),
                        Err(e) => {
                            debug!("Lenient parse with {} failed: {}", encoding, e);
                            None
                        }
                    }
                }
                Err(e) => {
                    debug!("Parse with {} failed: {}", encoding, e);
                    None
                }
            };

            if let Some((table, mode, skipped_lines)) = attempt {
                let report = LoadReport {
                    encoding: Some(encoding),
                    mode,
                    rows_read: table.len(),
                    skipped_lines,
                    source_sha256,
                };
                Self::log_outcome(&report);
                return (table, report);
            }
        }

        // Last resort: replacement-decode and keep whatever parses
        let text = String::from_utf8_lossy(bytes);
        let (table, skipped_lines) = parse_lenient(&text).unwrap_or_default();
        let report = LoadReport {
            encoding: None,
            mode: ParseMode::LossyFallback,
            rows_read: table.len(),
            skipped_lines,
            source_sha256,
        };
        Self::log_outcome(&report);
        (table, report)
    }

    fn log_outcome(report: &LoadReport) {
        let encoding = report.encoding.map(|e| e.name()).unwrap_or("utf-8 (lossy)");
        ExtractMetrics::record_load(report.rows_read, report.skipped_lines, report.degraded());
        if report.degraded() {
            warn!(
                "⚠️ Degraded load: encoding={} mode={:?} rows={} skipped_lines={}",
                encoding, report.mode, report.rows_read, report.skipped_lines
            );
        } else {
            info!("✅ Loaded {} rows (encoding={})", report.rows_read, encoding);
        }
    }
}

fn reader(text: &str) -> csv::Reader<&[u8]> {
    // Short rows are padded later, so the reader itself must accept them
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes())
}

fn read_headers(rdr: &mut csv::Reader<&[u8]>) -> std::result::Result<Vec<String>, ParseFailure> {
    let headers = rdr
        .headers()
        .map_err(|e| ParseFailure::Other(e.to_string()))?;
    if headers.is_empty() {
        return Err(ParseFailure::Other("no columns to parse".to_string()));
    }
    Ok(headers.iter().map(|h| h.trim().to_string()).collect())
}

fn to_row(record: &csv::StringRecord, width: usize) -> Vec<String> {
    let mut row: Vec<String> = record.iter().map(str::to_owned).collect();
    row.resize(width, String::new());
    row
}

/// Every row must fit under the header. Rows with fewer fields are padded
/// with blanks; rows with more fields are malformed.
fn parse_strict(text: &str) -> std::result::Result<RawTable, ParseFailure> {
    let mut rdr = reader(text);
    let headers = read_headers(&mut rdr)?;
    let width = headers.len();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| ParseFailure::Malformed(e.to_string()))?;
        if record.len() > width {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(ParseFailure::Malformed(format!(
                "line {line}: expected {width} fields, saw {}",
                record.len()
            )));
        }
        rows.push(to_row(&record, width));
    }
    Ok(RawTable::new(headers, rows))
}

/// Like [`parse_strict`] but malformed lines are skipped and counted.
fn parse_lenient(text: &str) -> std::result::Result<(RawTable, usize), ParseFailure> {
    let mut rdr = reader(text);
    let headers = read_headers(&mut rdr)?;
    let width = headers.len();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        match result {
            Ok(record) if record.len() <= width => rows.push(to_row(&record, width)),
            Ok(record) => {
                debug!(
                    "Skipping line {}: {} fields",
                    record.position().map(|p| p.line()).unwrap_or_default(),
                    record.len()
                );
                skipped += 1;
            }
            Err(e) => {
                debug!("Skipping unparseable line: {}", e);
                skipped += 1;
            }
        }
    }
    Ok((RawTable::new(headers, rows), skipped))
}
