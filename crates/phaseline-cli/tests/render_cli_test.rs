//! End-to-end tests for the `phaseline` binary.
//!
//! Each test points `XDG_CONFIG_HOME` at a fresh temporary directory so a
//! developer's own config file never leaks in.

use std::path::Path;
use std::process::{Command, Output};

use phaseline_test_utils::{
    record, sample_portfolio, write_csv, write_input, write_toml, write_xlsx,
};

fn phaseline(config_home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_phaseline"))
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("PHASELINE_INPUT")
        .env_remove("PHASELINE_OUTPUT_DIR")
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run phaseline binary")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn render_writes_dated_svg() {
    let input = write_csv(&sample_portfolio());
    let out_dir = input.dir.path().join("charts");
    let output = phaseline(
        input.dir.path(),
        &[
            "render",
            "--input",
            input.path.to_str().unwrap(),
            "--output-dir",
            out_dir.to_str().unwrap(),
            "--today",
            "2024-08-15",
            "--format",
            "svg",
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let artifact = out_dir.join("projects_timeline_2024-08-15.svg");
    let svg = std::fs::read_to_string(&artifact).expect("artifact should exist");
    assert!(svg.contains("Warehouse"));
    assert!(svg.contains("Fleet"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("projects_timeline_2024-08-15.svg"));
}

#[test]
fn render_writes_png_from_toml_input() {
    let input = write_toml(&sample_portfolio());
    let out_dir = input.dir.path().join("output");
    let output = phaseline(
        input.dir.path(),
        &[
            "render",
            "--input",
            input.path.to_str().unwrap(),
            "--output-dir",
            out_dir.to_str().unwrap(),
            "--today",
            "2024-08-15",
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let bytes = std::fs::read(out_dir.join("projects_timeline_2024-08-15.png")).unwrap();
    assert_eq!(&bytes[..4], b"\x89PNG");
}

#[test]
fn invalid_interval_fails_without_artifact() {
    let mut records = sample_portfolio();
    records.push(record("Fleet", "Closure", "2025-06-01", "2025-05-01", None));
    let input = write_csv(&records);
    let out_dir = input.dir.path().join("output");
    let output = phaseline(
        input.dir.path(),
        &[
            "render",
            "--input",
            input.path.to_str().unwrap(),
            "--output-dir",
            out_dir.to_str().unwrap(),
            "--today",
            "2024-08-15",
        ],
    );
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("invalid interval"), "stderr: {err}");
    assert!(err.contains("Closure"), "stderr: {err}");
    assert!(!out_dir.exists(), "no artifact directory should be created");
}

#[test]
fn missing_column_is_load_failure() {
    let input = write_input("tasks.csv", "Project,Phase,Start,End\nP1,A,2024-01-01,2024-02-01\n");
    let output = phaseline(
        input.dir.path(),
        &["render", "--input", input.path.to_str().unwrap(), "--today", "2024-08-15"],
    );
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("failed to load records"), "stderr: {err}");
    assert!(err.contains("Gate"), "stderr: {err}");
}

#[test]
fn empty_input_still_renders() {
    let input = write_csv(&[]);
    let out_dir = input.dir.path().join("output");
    let output = phaseline(
        input.dir.path(),
        &[
            "render",
            "--input",
            input.path.to_str().unwrap(),
            "--output-dir",
            out_dir.to_str().unwrap(),
            "--today",
            "2024-08-15",
            "--format",
            "svg",
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let svg = std::fs::read_to_string(out_dir.join("projects_timeline_2024-08-15.svg")).unwrap();
    assert!(svg.contains("<svg"));
    assert!(!svg.contains("Timeline"), "no subplots means no axis title");
}

#[test]
fn render_reads_excel_workbook() {
    let input = write_xlsx(&sample_portfolio());
    let out_dir = input.dir.path().join("output");
    let output = phaseline(
        input.dir.path(),
        &[
            "render",
            "--input",
            input.path.to_str().unwrap(),
            "--output-dir",
            out_dir.to_str().unwrap(),
            "--today",
            "2024-08-15",
            "--format",
            "svg",
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let svg = std::fs::read_to_string(out_dir.join("projects_timeline_2024-08-15.svg")).unwrap();
    assert!(svg.contains("Stock build-up"));
}

#[test]
fn segments_json_reports_order_and_spacers() {
    let records = vec![
        record("P1", "Design", "2024-01-01", "2024-02-01", Some("G1")),
        record("P1", "Build", "2024-02-15", "2024-03-01", Some("G2")),
    ];
    let input = write_csv(&records);
    let output = phaseline(
        input.dir.path(),
        &["segments", "--json", "--input", input.path.to_str().unwrap()],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["order"], serde_json::json!(["Build", "Design"]));
    let segments = report["segments"].as_array().unwrap();
    assert_eq!(segments.len(), 3);
    let spacers: Vec<_> = segments.iter().filter(|s| s["visible"] == false).collect();
    assert_eq!(spacers.len(), 1);
    assert_eq!(spacers[0]["start"], "2024-01-01");
    assert_eq!(spacers[0]["end"], "2024-02-15");
}

#[test]
fn init_writes_config_once() {
    let tmp = tempfile::TempDir::new().unwrap();
    let first = phaseline(tmp.path(), &["init"]);
    assert!(first.status.success(), "stderr: {}", stderr(&first));
    let path = tmp.path().join("phaseline").join("config.toml");
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("[palette]"), "{contents}");

    let second = phaseline(tmp.path(), &["init"]);
    assert!(!second.status.success());
    assert!(stderr(&second).contains("already exists"));

    let forced = phaseline(tmp.path(), &["init", "--force"]);
    assert!(forced.status.success(), "stderr: {}", stderr(&forced));
}
