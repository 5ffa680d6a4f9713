//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against a temporary task log
//! and verify outputs.

use std::io::Write;
use std::process::Command;

use tempfile::NamedTempFile;

const TASK_LOG: &str = r#"
[[worktime]]
start = "09:00:00"
end = "17:00:00"

[[long_tasks]]
name = "thesis"
title = "Write thesis"
recorded_at = "2026-07-01T08:00:00Z"
latest_start = "2026-07-06T09:00:00Z"
deadline = "2026-07-31T17:00:00Z"
required_total = 100.0

[[progress]]
task = "thesis"
at = "2026-07-08T13:00:00Z"
progress = 10.0
spent = 14400

[[short_tasks]]
name = "errand"
title = "Renew passport"
recorded_at = "2026-07-01T08:00:00Z"
deadline = "2026-07-10T09:00:00Z"
earliest_start = "2026-07-06T09:00:00Z"
estimate = 7200

[[preferences]]
name = "errand"
"#;

/// Run a CLI command and return output.
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "paceline-cli", "--quiet", "--"])
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Write the fixture log to a temp file.
fn task_log_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(TASK_LOG.as_bytes())
        .expect("Failed to write task log");
    file
}

#[test]
fn test_score_outputs_stats_json() {
    let file = task_log_file();
    let (stdout, stderr, code) = run_cli(&[
        "score",
        "--file",
        file.path().to_str().unwrap(),
        "--at",
        "2026-07-08T13:00:00Z",
    ]);
    assert_eq!(code, 0, "score failed: {stderr}");

    let stats: serde_json::Value = serde_json::from_str(&stdout).expect("invalid JSON");
    assert!(stats["total_points"].is_i64());
    assert!(stats["long"]["thesis"]["points"].is_i64());
    assert!(stats["short"]["errand"]["points"].is_i64());
}

#[test]
fn test_plan_outputs_allocations() {
    let file = task_log_file();
    let (stdout, stderr, code) = run_cli(&[
        "plan",
        "--file",
        file.path().to_str().unwrap(),
        "--at",
        "2026-07-08T13:00:00Z",
        "--until",
        "2026-07-09T13:00:00Z",
    ]);
    assert_eq!(code, 0, "plan failed: {stderr}");

    let report: serde_json::Value = serde_json::from_str(&stdout).expect("invalid JSON");
    assert!(report["plan"]["allocations"]["errand"].is_i64());
    assert!(report["plan"]["allocations"]["thesis"].is_i64());
    assert_eq!(report["plan"]["pace"]["kind"], "per_day");
    assert!(report["total_recommended"].is_i64());
}

#[test]
fn test_tasks_lists_snapshot_in_preference_order() {
    let file = task_log_file();
    let (stdout, stderr, code) = run_cli(&[
        "tasks",
        "--file",
        file.path().to_str().unwrap(),
        "--at",
        "2026-07-08T13:00:00Z",
    ]);
    assert_eq!(code, 0, "tasks failed: {stderr}");

    let listing: serde_json::Value = serde_json::from_str(&stdout).expect("invalid JSON");
    assert_eq!(listing["long_tasks"][0]["name"], "thesis");
    assert_eq!(listing["short_tasks"][0]["name"], "errand");
}

#[test]
fn test_rows_after_cutoff_are_invisible() {
    let file = task_log_file();
    let (stdout, _, code) = run_cli(&[
        "tasks",
        "--file",
        file.path().to_str().unwrap(),
        "--at",
        "2026-06-01T00:00:00Z",
    ]);
    assert_eq!(code, 0);

    let listing: serde_json::Value = serde_json::from_str(&stdout).expect("invalid JSON");
    assert_eq!(listing["long_tasks"].as_array().unwrap().len(), 0);
}

#[test]
fn test_missing_file_fails() {
    let (_, stderr, code) = run_cli(&["score", "--file", "/nonexistent/log.toml"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error"));
}
