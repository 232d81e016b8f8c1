//! Integration tests for the rewards engine CLI.
//!
//! These tests run the actual binary and verify output against expected CSV files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;

/// Get path to test data file
fn test_data_path(filename: &str) -> String {
    format!("tests/data/{}", filename)
}

/// Run the binary with the given input file and return stdout
fn run_engine(input_file: &str) -> String {
    let mut cmd = Command::cargo_bin("rewards-engine").unwrap();
    let assert = cmd.arg(input_file).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

/// Normalize CSV for comparison (trim whitespace, drop blank lines)
fn normalize_csv(csv: &str) -> Vec<String> {
    csv.lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

#[test]
fn test_sample_flow_redeem_approve_deliver() {
    let output = run_engine(&test_data_path("sample_flow.csv"));
    let expected = fs::read_to_string(test_data_path("expected_flow.csv")).unwrap();

    assert_eq!(normalize_csv(&output), normalize_csv(&expected));
}

#[test]
fn test_sample_errors_bad_rows_are_skipped() {
    let output = run_engine(&test_data_path("sample_errors.csv"));
    let expected = fs::read_to_string(test_data_path("expected_errors.csv")).unwrap();

    assert_eq!(normalize_csv(&output), normalize_csv(&expected));
}

#[test]
fn test_missing_file_error() {
    let mut cmd = Command::cargo_bin("rewards-engine").unwrap();
    cmd.arg("nonexistent.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error").or(predicate::str::contains("Error")));
}

#[test]
fn test_missing_argument_error() {
    let mut cmd = Command::cargo_bin("rewards-engine").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Missing input file"));
}

#[test]
fn test_output_has_correct_header() {
    let output = run_engine(&test_data_path("sample_flow.csv"));
    assert!(output.starts_with("employee,email,active,balance"));
}

#[test]
fn test_output_sorted_by_employee_id() {
    let output = run_engine(&test_data_path("sample_flow.csv"));
    let employees: Vec<String> = output
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap().to_string())
        .collect();

    let mut sorted = employees.clone();
    sorted.sort();
    assert_eq!(employees, sorted);
}

#[test]
fn test_synthesized_input_via_tempfile() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "op,tag,employee,email,first_name,last_name,name,description,points,stock,event,product,reason"
    )
    .unwrap();
    writeln!(file, "register,,EMP009,nina@example.com,Nina,Lopez,,,,,,,").unwrap();
    writeln!(file, "allocate,,EMP009,,,,,Welcome bonus,150,,EVT009,,").unwrap();
    file.flush().unwrap();

    let output = run_engine(file.path().to_str().unwrap());
    assert!(output.contains("EMP009,nina@example.com,true,150"));
}
