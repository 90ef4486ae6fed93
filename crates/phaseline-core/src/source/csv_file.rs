//! CSV record source.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{LoadError, RecordSource, normalize_gate, parse_date};
use crate::record::PhaseRecord;

/// Header names every input table must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = ["Project", "Phase", "Start", "End", "Gate"];

/// A CSV file with a header row.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for CsvSource {
    fn load(&self) -> Result<Vec<PhaseRecord>, LoadError> {
        let file = File::open(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_csv(file, &self.path)
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Project")]
    project: String,
    #[serde(rename = "Phase")]
    phase: String,
    #[serde(rename = "Start")]
    start: String,
    #[serde(rename = "End")]
    end: String,
    #[serde(rename = "Gate", default)]
    gate: Option<String>,
}

/// Parse CSV from `reader`. `origin` is used only for error messages.
pub fn parse_csv<R: Read>(reader: R, origin: &Path) -> Result<Vec<PhaseRecord>, LoadError> {
    let csv_err = |source: csv::Error| LoadError::Csv {
        path: origin.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().map_err(csv_err)?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(LoadError::MissingColumn {
                path: origin.to_path_buf(),
                column,
            });
        }
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let raw = result.map_err(csv_err)?;
        let location = match raw.position() {
            Some(pos) => format!("line {}", pos.line()),
            None => format!("row {}", records.len() + 1),
        };
        let row: CsvRow = raw.deserialize(Some(&headers)).map_err(csv_err)?;
        records.push(into_record(row, origin, &location)?);
    }
    Ok(records)
}

fn into_record(row: CsvRow, origin: &Path, location: &str) -> Result<PhaseRecord, LoadError> {
    let missing = |column| LoadError::MissingValue {
        path: origin.to_path_buf(),
        location: location.to_string(),
        column,
    };
    if row.project.is_empty() {
        return Err(missing("Project"));
    }
    if row.phase.is_empty() {
        return Err(missing("Phase"));
    }

    let date = |column: &'static str, value: &str| {
        parse_date(value).ok_or_else(|| LoadError::InvalidDate {
            path: origin.to_path_buf(),
            location: location.to_string(),
            column,
            value: value.to_string(),
        })
    };
    let start = date("Start", &row.start)?;
    let end = date("End", &row.end)?;

    Ok(PhaseRecord {
        project: row.project,
        phase: row.phase,
        start,
        end,
        gate: normalize_gate(row.gate),
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn parse(text: &str) -> Result<Vec<PhaseRecord>, LoadError> {
        parse_csv(text.as_bytes(), Path::new("inline.csv"))
    }

    #[test]
    fn parses_rows_in_order() {
        let records = parse(
            "Project,Phase,Start,End,Gate\n\
             P1,Design,2024-01-01,2024-02-01,G1\n\
             P1,Build,2024-02-15 00:00:00,2024-03-01,\n",
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].gate.as_deref(), Some("G1"));
        assert_eq!(records[1].start, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
        assert_eq!(records[1].gate, None);
    }

    #[test]
    fn column_order_is_free_and_extras_ignored() {
        let records = parse(
            "Gate,End,Owner,Start,Phase,Project\n\
             G9,2024-05-01,alice,2024-04-01,Closure,P2\n",
        )
        .unwrap();
        assert_eq!(records[0].project, "P2");
        assert_eq!(records[0].phase, "Closure");
        assert_eq!(records[0].gate.as_deref(), Some("G9"));
    }

    #[test]
    fn missing_column_is_reported() {
        let err = parse("Project,Phase,Start,End\nP1,A,2024-01-01,2024-01-02\n").unwrap_err();
        assert!(
            matches!(err, LoadError::MissingColumn { column: "Gate", .. }),
            "expected MissingColumn, got: {err}"
        );
    }

    #[test]
    fn invalid_date_names_line_and_column() {
        let err = parse(
            "Project,Phase,Start,End,Gate\n\
             P1,A,2024-01-01,2024-01-02,\n\
             P1,B,soon,2024-01-02,\n",
        )
        .unwrap_err();
        match err {
            LoadError::InvalidDate {
                location,
                column,
                value,
                ..
            } => {
                assert_eq!(location, "line 3");
                assert_eq!(column, "Start");
                assert_eq!(value, "soon");
            }
            other => panic!("expected InvalidDate, got: {other}"),
        }
    }

    #[test]
    fn empty_project_is_rejected() {
        let err = parse("Project,Phase,Start,End,Gate\n,A,2024-01-01,2024-01-02,\n").unwrap_err();
        assert!(matches!(err, LoadError::MissingValue { column: "Project", .. }), "{err}");
    }

    #[test]
    fn header_only_is_empty() {
        assert!(parse("Project,Phase,Start,End,Gate\n").unwrap().is_empty());
    }
}
