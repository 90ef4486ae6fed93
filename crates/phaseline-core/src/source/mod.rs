//! Record sources: where [`PhaseRecord`]s come from.
//!
//! Three on-disk encodings are supported, selected by file extension:
//! - `.csv` with a header row naming the `Project`, `Phase`, `Start`, `End`
//!   and `Gate` columns.
//! - `.xlsx` whose first worksheet has the same header row. Date cells may
//!   be Excel dates or `YYYY-MM-DD` text.
//! - `.toml` with one `[[phases]]` table per record.

pub mod csv_file;
pub mod toml_file;
pub mod xlsx_file;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

use crate::record::PhaseRecord;

pub use csv_file::{CsvSource, REQUIRED_COLUMNS, parse_csv};
pub use toml_file::{PhasesToml, TomlSource, parse_toml};
pub use xlsx_file::{XlsxSource, parse_xlsx};

/// Errors raised while loading input records.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed TOML in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot read workbook {}: {source}", path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("workbook {} has no worksheets", path.display())]
    NoWorksheet { path: PathBuf },

    #[error("{} is missing required column {column:?}", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{}, {location}: column {column:?} is empty", path.display())]
    MissingValue {
        path: PathBuf,
        location: String,
        column: &'static str,
    },

    #[error("{}, {location}: invalid date {value:?} in column {column:?} (expected YYYY-MM-DD)", path.display())]
    InvalidDate {
        path: PathBuf,
        location: String,
        column: &'static str,
        value: String,
    },

    #[error("unsupported input format for {} (expected .csv, .xlsx or .toml)", path.display())]
    UnsupportedFormat { path: PathBuf },
}

/// Anything that can supply phase records.
pub trait RecordSource {
    /// Load every record. Either all records load or the call fails.
    fn load(&self) -> Result<Vec<PhaseRecord>, LoadError>;

    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;
}

/// Pick a source for `path` based on its extension.
pub fn source_for_path(path: &Path) -> Result<Box<dyn RecordSource>, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("csv") => Ok(Box::new(CsvSource::new(path))),
        Some("toml") => Ok(Box::new(TomlSource::new(path))),
        Some("xlsx") => Ok(Box::new(XlsxSource::new(path))),
        _ => Err(LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Load all records from `path`.
pub fn load_records(path: &Path) -> Result<Vec<PhaseRecord>, LoadError> {
    let source = source_for_path(path)?;
    let records = source.load()?;
    debug!(source = %source.describe(), records = records.len(), "loaded records");
    Ok(records)
}

/// Parse a calendar date, accepting `YYYY-MM-DD` optionally followed by a
/// time part (`2024-01-01 00:00:00`, `2024-01-01T00:00:00`), which is
/// dropped.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let date_part = trimmed.split(['T', ' ']).next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Normalize an optional gate: blank means no gate.
pub(crate) fn normalize_gate(gate: Option<String>) -> Option<String> {
    gate.map(|g| g.trim().to_string()).filter(|g| !g.is_empty())
}
