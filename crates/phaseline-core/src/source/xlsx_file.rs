//! Excel workbook record source. Records are read from the first worksheet.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use calamine::{Data, Range, Reader, Xlsx};
use chrono::{Days, NaiveDate};

use super::{LoadError, REQUIRED_COLUMNS, RecordSource, normalize_gate, parse_date};
use crate::record::PhaseRecord;

/// An `.xlsx` workbook whose first worksheet has a header row.
#[derive(Debug, Clone)]
pub struct XlsxSource {
    path: PathBuf,
}

impl XlsxSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for XlsxSource {
    fn load(&self) -> Result<Vec<PhaseRecord>, LoadError> {
        let file = File::open(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_xlsx(BufReader::new(file), &self.path)
    }

    fn describe(&self) -> String {
        format!("xlsx:{}", self.path.display())
    }
}

/// Parse a workbook from `reader`. `origin` is used only for error messages.
pub fn parse_xlsx<R: Read + Seek>(reader: R, origin: &Path) -> Result<Vec<PhaseRecord>, LoadError> {
    let workbook_err = |source| LoadError::Workbook {
        path: origin.to_path_buf(),
        source,
    };
    let mut workbook = Xlsx::new(reader).map_err(workbook_err)?;
    let sheet = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::NoWorksheet {
            path: origin.to_path_buf(),
        })?
        .map_err(workbook_err)?;
    parse_sheet(&sheet, origin)
}

fn parse_sheet(sheet: &Range<Data>, origin: &Path) -> Result<Vec<PhaseRecord>, LoadError> {
    // Spreadsheet row number (1-based) of the first row in the used range.
    let first_row = sheet.start().map_or(1, |(row, _)| row as usize + 1);
    let mut rows = sheet.rows();

    let header: Vec<String> = rows
        .next()
        .map(|cells| cells.iter().map(cell_text).collect())
        .unwrap_or_default();
    let mut columns = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, column) in columns.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = header
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| LoadError::MissingColumn {
                path: origin.to_path_buf(),
                column,
            })?;
    }
    let [project, phase, start, end, gate] = columns;

    let mut records = Vec::new();
    for (offset, cells) in rows.enumerate() {
        if cells.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let location = format!("row {}", first_row + offset + 1);
        let cell = |i: usize| cells.get(i).unwrap_or(&Data::Empty);
        let missing = |column| LoadError::MissingValue {
            path: origin.to_path_buf(),
            location: location.clone(),
            column,
        };
        let date = |column: &'static str, i: usize| {
            cell_date(cell(i)).ok_or_else(|| LoadError::InvalidDate {
                path: origin.to_path_buf(),
                location: location.clone(),
                column,
                value: cell_text(cell(i)),
            })
        };

        let project_name = cell_text(cell(project));
        if project_name.is_empty() {
            return Err(missing("Project"));
        }
        let phase_name = cell_text(cell(phase));
        if phase_name.is_empty() {
            return Err(missing("Phase"));
        }
        records.push(PhaseRecord {
            project: project_name,
            phase: phase_name,
            start: date("Start", start)?,
            end: date("End", end)?,
            gate: normalize_gate(Some(cell_text(cell(gate)))),
        });
    }
    Ok(records)
}

/// Cell contents as trimmed text. Whole numbers print without a fraction.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn cell_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) => parse_date(s),
        Data::DateTime(dt) => excel_serial_date(dt.as_f64()),
        Data::Float(f) => excel_serial_date(*f),
        Data::Int(i) => excel_serial_date(*i as f64),
        _ => None,
    }
}

/// Calendar date of an Excel 1900-system serial number. The time of day is
/// dropped.
pub fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let days = serial.floor() as u64;
    // Serials below 60 predate the phantom 1900-02-29 Excel counts.
    let days = if days < 60 { days + 1 } else { days };
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(days))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sheet(rows: Vec<Vec<Data>>) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(Vec::len).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                range.set_value((r as u32, c as u32), value);
            }
        }
        range
    }

    fn s(text: &str) -> Data {
        Data::String(text.to_string())
    }

    fn header() -> Vec<Data> {
        REQUIRED_COLUMNS.iter().map(|c| s(c)).collect()
    }

    #[test]
    fn serial_dates_follow_excel_calendar() {
        assert_eq!(excel_serial_date(1.0), Some(d("1900-01-01")));
        assert_eq!(excel_serial_date(45292.0), Some(d("2024-01-01")));
        assert_eq!(excel_serial_date(45292.75), Some(d("2024-01-01")));
        assert_eq!(excel_serial_date(0.0), None);
        assert_eq!(excel_serial_date(f64::NAN), None);
    }

    #[test]
    fn reads_numeric_and_text_dates() {
        let range = sheet(vec![
            header(),
            vec![s("P1"), s("Design"), Data::Float(45292.0), s("2024-02-01"), s("G1")],
            vec![s("P1"), s("Build"), s("2024-02-15 00:00:00"), Data::Int(45352), Data::Empty],
        ]);
        let records = parse_sheet(&range, Path::new("inline.xlsx")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!((records[0].start, records[0].end), (d("2024-01-01"), d("2024-02-01")));
        assert_eq!(records[0].gate.as_deref(), Some("G1"));
        assert_eq!((records[1].start, records[1].end), (d("2024-02-15"), d("2024-03-01")));
        assert_eq!(records[1].gate, None);
    }

    #[test]
    fn numeric_gate_reads_as_whole_number() {
        let range = sheet(vec![
            header(),
            vec![s("P1"), s("Design"), s("2024-01-01"), s("2024-02-01"), Data::Float(3.0)],
        ]);
        let records = parse_sheet(&range, Path::new("inline.xlsx")).unwrap();
        assert_eq!(records[0].gate.as_deref(), Some("3"));
    }

    #[test]
    fn blank_rows_are_skipped() {
        let range = sheet(vec![
            header(),
            vec![Data::Empty, Data::Empty, Data::Empty, Data::Empty, Data::Empty],
            vec![s("P1"), s("Design"), s("2024-01-01"), s("2024-02-01"), Data::Empty],
        ]);
        assert_eq!(parse_sheet(&range, Path::new("inline.xlsx")).unwrap().len(), 1);
    }

    #[test]
    fn missing_column_is_reported() {
        let range = sheet(vec![vec![s("Project"), s("Phase"), s("Start"), s("End")]]);
        let err = parse_sheet(&range, Path::new("inline.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { column: "Gate", .. }), "{err}");
    }

    #[test]
    fn invalid_date_names_row_and_column() {
        let range = sheet(vec![
            header(),
            vec![s("P1"), s("Design"), s("2024-01-01"), s("later"), Data::Empty],
        ]);
        match parse_sheet(&range, Path::new("inline.xlsx")).unwrap_err() {
            LoadError::InvalidDate {
                location,
                column,
                value,
                ..
            } => {
                assert_eq!(location, "row 2");
                assert_eq!(column, "End");
                assert_eq!(value, "later");
            }
            other => panic!("expected InvalidDate, got: {other}"),
        }
    }

    #[test]
    fn empty_phase_is_rejected() {
        let range = sheet(vec![
            header(),
            vec![s("P1"), Data::Empty, s("2024-01-01"), s("2024-02-01"), Data::Empty],
        ]);
        let err = parse_sheet(&range, Path::new("inline.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::MissingValue { column: "Phase", .. }), "{err}");
    }
}
