#![allow(clippy::unwrap_used)] // Tests can use unwrap() for simplicity
//! CLI integration tests for the etalon binary.
//!
//! Test Approach: CLI integration tests with assert_cmd

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

const CSV: &str = "phone_num,rep_date,target
79001234567,2018-11-01,1
,2018-11-08,0
79001234569,2018-11-15,inf
79001234570,2018-11-22,0
79001234571,2018-11-29,1
79001234572,2018-12-06,0
79001234573,2018-12-13,1
";

fn etalon() -> Command {
    Command::cargo_bin("etalon").unwrap()
}

fn write_csv(dir: &Path) -> PathBuf {
    let path = dir.join("etalon.csv");
    std::fs::write(&path, CSV).unwrap();
    path
}

const ROLES: [&str; 6] = [
    "--identifier",
    "phone_num",
    "--date",
    "rep_date",
    "--label",
    "target",
];

#[test]
fn test_help_lists_commands() {
    etalon()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("metrics"))
        .stdout(predicate::str::contains("compare"));
}

#[test]
fn test_validate_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path());
    etalon()
        .arg("validate")
        .arg(&path)
        .args(ROLES)
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid: 5"))
        .stdout(predicate::str::contains("Invalid: 2"));
}

#[test]
fn test_validate_json_with_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path());
    let output = dir.path().join("flagged.csv");
    etalon()
        .arg("validate")
        .arg(&path)
        .args(ROLES)
        .args(["--format", "json", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"invalid\": 2"));

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.lines().next().unwrap().ends_with("is_valid"));
}

#[test]
fn test_validate_missing_role_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path());
    etalon()
        .arg("validate")
        .arg(&path)
        .args(["--identifier", "phone_num"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_metrics_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path());
    etalon()
        .arg("metrics")
        .arg(&path)
        .args(ROLES)
        .args(["--bins", "2", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"task_type\": \"BINARY\""))
        .stdout(predicate::str::contains("\"label\": \"auc\""))
        .stdout(predicate::str::contains("\"valid_count\": 5"));
}

#[test]
fn test_metrics_text_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path());
    etalon()
        .arg("metrics")
        .arg(&path)
        .args(ROLES)
        .args(["--degenerate", "pad", "--date-cut", "mean"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Etalon Metrics Report"))
        .stdout(predicate::str::contains("2018-11-01 00:00"));
}

#[test]
fn test_metrics_rejects_zero_bins() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path());
    etalon()
        .arg("metrics")
        .arg(&path)
        .args(ROLES)
        .args(["--bins", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bins must be at least 1"));
}

#[test]
fn test_metrics_unknown_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path());
    etalon()
        .arg("metrics")
        .arg(&path)
        .args(ROLES)
        .args(["--degenerate", "squash"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("squash"));
}

#[test]
fn test_compare_against_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path());
    let baseline = dir.path().join("baseline.json");

    etalon()
        .arg("metrics")
        .arg(&path)
        .args(ROLES)
        .arg("--output")
        .arg(&baseline)
        .assert()
        .success();

    etalon()
        .arg("compare")
        .arg(&path)
        .args(ROLES)
        .arg("--baseline")
        .arg(&baseline)
        .assert()
        .success()
        .stdout(predicate::str::contains("matches baseline"));

    etalon()
        .arg("compare")
        .arg(&path)
        .args(ROLES)
        .args(["--bins", "3", "--baseline"])
        .arg(&baseline)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("differ from baseline"));
}

#[test]
fn test_metrics_reads_gzipped_csv() {
    use std::io::Write;

    use flate2::{write::GzEncoder, Compression};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("etalon.csv.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(CSV.as_bytes()).unwrap();
    std::fs::write(&path, encoder.finish().unwrap()).unwrap();

    etalon()
        .arg("metrics")
        .arg(&path)
        .args(ROLES)
        .args(["--cut-strategy", "equal-width", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 7"))
        .stdout(predicate::str::contains("\"valid_count\": 5"));
}

#[test]
fn test_unsupported_input_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("etalon.xlsx");
    std::fs::write(&path, "not a table").unwrap();
    etalon()
        .arg("metrics")
        .arg(&path)
        .args(ROLES)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unsupported format"));
}

#[test]
fn test_verbose_logs_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path());
    etalon()
        .arg("--verbose")
        .arg("metrics")
        .arg(&path)
        .args(ROLES)
        .assert()
        .success()
        .stderr(predicate::str::contains("computed metrics"));
}
