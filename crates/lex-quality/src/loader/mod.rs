//! CSV ingestion with encoding detection, delimiter sniffing and bad-row recovery.
//!
//! Loading is tolerant: an unknown encoding falls back to windows-1252, an
//! unrecognisable delimiter falls back to a comma, rows with more fields
//! than the header are skipped and shorter rows are padded with nulls. Only a total parse failure is reported as
//! [`QualityError::LoadFailed`].
//!
//! # Example
//!
//! ```rust,ignore
//! use lex_quality::{QualityConfig, loader};
//!
//! let loaded = loader::load_csv_path("data.csv", &QualityConfig::default())?;
//! println!(
//!     "{} rows, delimiter {:?}, {} rows skipped",
//!     loaded.frame.height(),
//!     loaded.report.delimiter,
//!     loaded.report.skipped_rows
//! );
//! ```

mod delimiter;
mod encoding;

pub use delimiter::{CANDIDATE_DELIMITERS, DEFAULT_DELIMITER, sniff_delimiter};
pub use encoding::{DecodedText, decode_bytes, fallback_encoding};

use crate::config::QualityConfig;
use crate::error::{QualityError, Result};
use delimiter::{flexible_reader, is_blank};
use polars::prelude::*;
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

/// What the loader had to decide or repair while reading the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    /// Name of the encoding used to decode the input.
    pub encoding: String,
    pub used_fallback_encoding: bool,
    /// The sniffed (or default) field delimiter.
    pub delimiter: char,
    /// Rows dropped because they had more fields than the header.
    pub skipped_rows: usize,
    /// Rows that had fewer fields than the header and were padded with nulls.
    pub padded_rows: usize,
}

/// A decoded table together with the loader's report.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub frame: DataFrame,
    pub report: LoadReport,
}

/// Load a CSV file from disk.
pub fn load_csv_path(path: impl AsRef<Path>, config: &QualityConfig) -> Result<LoadedTable> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| QualityError::from(e).with_context(format!("Reading {}", path.display())))?;
    info!("Read {} bytes from {}", bytes.len(), path.display());
    load_csv_bytes(&bytes, config)
}

/// Load a CSV from raw bytes of unknown encoding and delimiter.
pub fn load_csv_bytes(bytes: &[u8], config: &QualityConfig) -> Result<LoadedTable> {
    let decoded = decode_bytes(bytes);
    let delimiter = sniff_delimiter(&decoded.text, config.sniff_sample_bytes);
    debug!(
        "Using encoding {} and delimiter {:?}",
        decoded.encoding.name(),
        delimiter as char
    );

    let normalized = normalize_records(&decoded.text, delimiter)?;
    if normalized.skipped_rows > 0 {
        warn!(
            "Skipped {} malformed rows with too many fields",
            normalized.skipped_rows
        );
    }

    let frame = parse_frame(normalized.text, delimiter, config)?;
    info!("Dataset loaded: {:?}", frame.shape());

    Ok(LoadedTable {
        frame,
        report: LoadReport {
            encoding: decoded.encoding.name().to_string(),
            used_fallback_encoding: decoded.used_fallback,
            delimiter: delimiter as char,
            skipped_rows: normalized.skipped_rows,
            padded_rows: normalized.padded_rows,
        },
    })
}

struct NormalizedText {
    text: String,
    skipped_rows: usize,
    padded_rows: usize,
}

/// Drop blank lines and over-long rows; pad short rows to the header width.
///
/// Records are re-written with consistent quoting, so a stray quote inside an
/// unquoted field reaches polars as a literal character.
fn normalize_records(text: &str, delimiter: u8) -> Result<NormalizedText> {
    let load_failed = |e: csv::Error| QualityError::LoadFailed(e.to_string());

    let mut reader = flexible_reader(text, delimiter);
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::with_capacity(text.len()));

    let mut record = csv::StringRecord::new();
    let mut header_width = None;
    let mut skipped_rows = 0;
    let mut padded_rows = 0;
    while reader.read_record(&mut record).map_err(load_failed)? {
        if is_blank(&record) {
            continue;
        }
        let Some(width) = header_width else {
            header_width = Some(record.len());
            writer.write_record(&record).map_err(load_failed)?;
            continue;
        };

        if record.len() > width {
            skipped_rows += 1;
            continue;
        }
        if record.len() < width {
            padded_rows += 1;
            while record.len() < width {
                record.push_field("");
            }
        }
        writer.write_record(&record).map_err(load_failed)?;
    }

    if header_width.is_none() {
        return Err(QualityError::LoadFailed(
            "input contains no header row".to_string(),
        ));
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| QualityError::LoadFailed(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| QualityError::LoadFailed(e.to_string()))?;

    Ok(NormalizedText {
        text,
        skipped_rows,
        padded_rows,
    })
}

fn parse_frame(text: String, delimiter: u8, config: &QualityConfig) -> Result<DataFrame> {
    // Strategy 1: with date parsing so temporal columns get native dtypes
    match read_with_options(text.clone(), delimiter, config, true) {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Loading with date parsing failed: {}", e),
    }

    // Strategy 2: plain parsing
    read_with_options(text, delimiter, config, false)
        .map_err(|e| QualityError::LoadFailed(e.to_string()))
}

fn read_with_options(
    text: String,
    delimiter: u8,
    config: &QualityConfig,
    try_parse_dates: bool,
) -> PolarsResult<DataFrame> {
    let cursor = Cursor::new(text);
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(config.infer_schema_rows))
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(delimiter)
                .with_quote_char(Some(b'"'))
                .with_try_parse_dates(try_parse_dates),
        )
        .into_reader_with_file_handle(cursor)
        .finish()
}
