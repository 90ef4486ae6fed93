//! TOML record source.
//!
//! ```toml
//! [[phases]]
//! project = "Warehouse"
//! phase = "Pre-study"
//! start = 2024-01-01
//! end = 2024-03-31
//! gate = "G1"
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use toml::value::Datetime;

use super::{LoadError, RecordSource, normalize_gate};
use crate::record::PhaseRecord;

/// Top-level structure of a phases TOML file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PhasesToml {
    #[serde(default)]
    pub phases: Vec<PhaseToml>,
}

/// A single `[[phases]]` entry. Dates are TOML local dates.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PhaseToml {
    pub project: String,
    pub phase: String,
    pub start: Datetime,
    pub end: Datetime,
    #[serde(default)]
    pub gate: Option<String>,
}

/// A TOML file of `[[phases]]` tables.
#[derive(Debug, Clone)]
pub struct TomlSource {
    path: PathBuf,
}

impl TomlSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for TomlSource {
    fn load(&self) -> Result<Vec<PhaseRecord>, LoadError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_toml(&content, &self.path)
    }

    fn describe(&self) -> String {
        format!("toml:{}", self.path.display())
    }
}

/// Parse a phases TOML document. `origin` is used only for error messages.
pub fn parse_toml(content: &str, origin: &Path) -> Result<Vec<PhaseRecord>, LoadError> {
    let doc: PhasesToml = toml::from_str(content).map_err(|source| LoadError::Toml {
        path: origin.to_path_buf(),
        source,
    })?;

    doc.phases
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let location = format!("phases[{i}]");
            let date = |column: &'static str, value: &Datetime| {
                to_date(value).ok_or_else(|| LoadError::InvalidDate {
                    path: origin.to_path_buf(),
                    location: location.clone(),
                    column,
                    value: value.to_string(),
                })
            };
            let start = date("start", &entry.start)?;
            let end = date("end", &entry.end)?;
            for (column, value) in [("project", &entry.project), ("phase", &entry.phase)] {
                if value.trim().is_empty() {
                    return Err(LoadError::MissingValue {
                        path: origin.to_path_buf(),
                        location: location.clone(),
                        column,
                    });
                }
            }
            Ok(PhaseRecord {
                project: entry.project,
                phase: entry.phase,
                start,
                end,
                gate: normalize_gate(entry.gate),
            })
        })
        .collect()
}

/// The calendar date of a TOML date or datetime. Times and offsets are
/// ignored; a bare time has no date.
fn to_date(value: &Datetime) -> Option<NaiveDate> {
    let date = value.date?;
    NaiveDate::from_ymd_opt(
        i32::from(date.year),
        u32::from(date.month),
        u32::from(date.day),
    )
}
