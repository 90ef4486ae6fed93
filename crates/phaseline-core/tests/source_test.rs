//! Integration tests for loading records from files on disk.

use std::path::Path;

use phaseline_core::source::{LoadError, load_records};
use phaseline_test_utils::{record, sample_portfolio, write_csv, write_input, write_toml, write_xlsx};

#[test]
fn csv_file_round_trips_sample() {
    let input = write_csv(&sample_portfolio());
    let records = load_records(&input.path).unwrap();
    assert_eq!(records, sample_portfolio());
}

#[test]
fn toml_file_round_trips_sample() {
    let input = write_toml(&sample_portfolio());
    let records = load_records(&input.path).unwrap();
    assert_eq!(records, sample_portfolio());
}

#[test]
fn missing_file_is_io_error() {
    let err = load_records(Path::new("/nonexistent/phaseline/project_tasks.csv")).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }), "{err}");
}

#[test]
fn missing_column_in_file_is_reported_with_path() {
    let input = write_input("tasks.csv", "Project,Phase,End,Gate\nP1,A,2024-01-01,\n");
    let err = load_records(&input.path).unwrap_err();
    assert!(matches!(err, LoadError::MissingColumn { column: "Start", .. }), "{err}");
    assert!(err.to_string().contains("tasks.csv"), "{err}");
}

#[test]
fn xlsx_workbook_round_trips_sample() {
    let input = write_xlsx(&sample_portfolio());
    let records = load_records(&input.path).unwrap();
    assert_eq!(records, sample_portfolio());
}

#[test]
fn xlsx_without_gates_loads_as_ungated() {
    let input = write_xlsx(&[record("P1", "Design", "2024-01-01", "2024-02-01", None)]);
    let records = load_records(&input.path).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].gate, None);
}

#[test]
fn corrupt_workbook_is_reported() {
    let input = write_input("project_tasks.xlsx", "Project,Phase,Start,End,Gate\n");
    let err = load_records(&input.path).unwrap_err();
    assert!(matches!(err, LoadError::Workbook { .. }), "{err}");
    assert!(err.to_string().contains("project_tasks.xlsx"), "{err}");
}

#[test]
fn other_spreadsheet_formats_are_unsupported() {
    let input = write_input("project_tasks.ods", "");
    let err = load_records(&input.path).unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedFormat { .. }), "{err}");
}
