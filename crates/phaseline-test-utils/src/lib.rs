//! Shared fixtures for phaseline integration tests.
//!
//! Provides terse record constructors, a small sample portfolio, and helpers
//! that write records to temporary CSV, TOML and Excel inputs.

use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use tempfile::TempDir;

use phaseline_core::PhaseRecord;

/// Parse a `YYYY-MM-DD` literal. Panics on malformed input.
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .unwrap_or_else(|e| panic!("bad date literal {s:?}: {e}"))
}

/// Build a record from string literals.
pub fn record(project: &str, phase: &str, start: &str, end: &str, gate: Option<&str>) -> PhaseRecord {
    PhaseRecord {
        project: project.to_string(),
        phase: phase.to_string(),
        start: date(start),
        end: date(end),
        gate: gate.map(str::to_string),
    }
}

/// Two projects using the stock phase names, spanning 2024 and 2025.
pub fn sample_portfolio() -> Vec<PhaseRecord> {
    vec![
        record("Warehouse", "Preparation", "2024-01-08", "2024-03-29", Some("G0")),
        record("Warehouse", "Pre-study", "2024-04-01", "2024-06-28", Some("G1")),
        record("Warehouse", "Implementation", "2024-07-01", "2025-03-31", Some("G3")),
        record("Warehouse", "Closure", "2025-04-01", "2025-05-30", Some("G5")),
        record("Fleet", "Pre-study", "2024-03-04", "2024-05-31", Some("G1")),
        record("Fleet", "Establishment", "2024-06-03", "2024-10-31", Some("G2")),
        record("Fleet", "Stock build-up", "2024-11-01", "2025-02-28", None),
    ]
}

/// A temporary directory holding an input file. The directory is removed
/// when dropped.
pub struct InputFile {
    pub dir: TempDir,
    pub path: PathBuf,
}

/// Render records as CSV text with the standard header.
pub fn to_csv(records: &[PhaseRecord]) -> String {
    let mut out = String::from("Project,Phase,Start,End,Gate\n");
    for r in records {
        let _ = writeln!(
            out,
            "{},{},{},{},{}",
            r.project,
            r.phase,
            r.start,
            r.end,
            r.gate.as_deref().unwrap_or("")
        );
    }
    out
}

/// Render records as `[[phases]]` TOML.
pub fn to_toml(records: &[PhaseRecord]) -> String {
    let mut out = String::new();
    for r in records {
        let _ = writeln!(out, "[[phases]]");
        let _ = writeln!(out, "project = {:?}", r.project);
        let _ = writeln!(out, "phase = {:?}", r.phase);
        let _ = writeln!(out, "start = {}", r.start);
        let _ = writeln!(out, "end = {}", r.end);
        if let Some(gate) = &r.gate {
            let _ = writeln!(out, "gate = {gate:?}");
        }
        let _ = writeln!(out);
    }
    out
}

/// Write `contents` to `name` inside a fresh temporary directory.
pub fn write_input(name: &str, contents: &str) -> InputFile {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, contents)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    InputFile { dir, path }
}

/// Write records to a temporary CSV file.
pub fn write_csv(records: &[PhaseRecord]) -> InputFile {
    write_input("project_tasks.csv", &to_csv(records))
}

/// Write records to a temporary TOML file.
pub fn write_toml(records: &[PhaseRecord]) -> InputFile {
    write_input("project_tasks.toml", &to_toml(records))
}

/// Excel serial number of `date` in the 1900 date system.
pub fn excel_serial(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).expect("valid epoch");
    (date - epoch).num_days() as f64
}

/// Write records to a temporary `.xlsx` workbook. Start and End are stored
/// as date-formatted Excel serials, the way a spreadsheet user enters them.
pub fn write_xlsx(records: &[PhaseRecord]) -> InputFile {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("project_tasks.xlsx");
    build_workbook(records, &path)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    InputFile { dir, path }
}

fn build_workbook(records: &[PhaseRecord], path: &std::path::Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let sheet = workbook.add_worksheet();
    for (col, name) in ["Project", "Phase", "Start", "End", "Gate"].into_iter().enumerate() {
        sheet.write_string(0, col as u16, name)?;
    }
    for (i, r) in records.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &r.project)?;
        sheet.write_string(row, 1, &r.phase)?;
        sheet.write_number_with_format(row, 2, excel_serial(r.start), &date_format)?;
        sheet.write_number_with_format(row, 3, excel_serial(r.end), &date_format)?;
        if let Some(gate) = &r.gate {
            sheet.write_string(row, 4, gate)?;
        }
    }
    workbook.save(path)
}
