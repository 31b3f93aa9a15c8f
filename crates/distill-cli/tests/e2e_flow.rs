//! End-to-end tests for the distill binary.
//!
//! Tests the full pipeline: read file → validate → identify → segment → print.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use tempfile::TempDir;

fn distill_binary() -> String {
    env!("CARGO_BIN_EXE_distill").to_string()
}

/// A command isolated from the user's config directory and environment.
fn distill(temp: &Path) -> Command {
    let mut cmd = Command::new(distill_binary());
    cmd.env("HOME", temp)
        .env("XDG_CONFIG_HOME", temp.join(".config"))
        .env_remove("RUST_LOG");
    for (key, _) in std::env::vars_os() {
        if key.to_string_lossy().starts_with("DISTILL_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

fn write_logs(temp: &Path, lines: &[&str]) -> std::path::PathBuf {
    let path = temp.join("logs.jsonl");
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "command should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

const CLICK: &str = r#"{"sessionID":"s1","clientTime":1000,"logType":"raw","type":"click","target":"button#save"}"#;
const SCROLL: &str = r#"{"sessionID":"s1","clientTime":1500,"logType":"raw","type":"scroll"}"#;
const LATE_CLICK: &str = r#"{"sessionID":"s1","clientTime":9000,"logType":"raw","type":"click"}"#;
const MISSING_SESSION: &str = r#"{"clientTime":1200,"logType":"raw","type":"click"}"#;

/// Records come out in time order with stable identifiers.
#[test]
fn test_ids_are_time_ordered_and_deterministic() {
    let temp = TempDir::new().unwrap();
    let logs = write_logs(temp.path(), &[LATE_CLICK, CLICK, SCROLL]);

    let first = stdout_json(
        &distill(temp.path())
            .arg("ids")
            .arg(&logs)
            .arg("--json")
            .output()
            .unwrap(),
    );
    let entries = first.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    let times: Vec<u64> = entries
        .iter()
        .map(|e| e["timestamp"].as_u64().unwrap())
        .collect();
    assert_eq!(times, [1000_u64, 1500, 9000]);
    assert_eq!(entries[0]["key"], "s1:1000:raw:1");

    // Same content in a different order yields the same identifiers
    let reordered = write_logs(temp.path(), &[SCROLL, CLICK, LATE_CLICK]);
    let second = stdout_json(
        &distill(temp.path())
            .arg("ids")
            .arg(&reordered)
            .arg("--json")
            .output()
            .unwrap(),
    );
    let ids = |v: &Value| -> Vec<String> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(ids(&first), ids(&second));
}

/// Human output lists one line per record plus a total.
#[test]
fn test_ids_human_output() {
    let temp = TempDir::new().unwrap();
    let logs = write_logs(temp.path(), &[CLICK, SCROLL]);

    let output = distill(temp.path()).arg("ids").arg(&logs).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().next().unwrap().starts_with("log_00000000000003e8_"));
    assert!(stdout.contains("1970-01-01T00:00:01.500Z  s1:1500:raw:1"));
    assert!(stdout.ends_with("2 records\n"));
}

/// Explicit windows may overlap and each keeps its own records.
#[test]
fn test_segment_overlapping_windows() {
    let temp = TempDir::new().unwrap();
    let logs = write_logs(temp.path(), &[CLICK, SCROLL, LATE_CLICK]);

    let segments = stdout_json(
        &distill(temp.path())
            .arg("segment")
            .arg(&logs)
            .args(["--window", "start=0..1500"])
            .args(["--window", "all=1970-01-01T00:00:00Z..10000"])
            .args(["--window", "empty=20000..30000"])
            .arg("--json")
            .output()
            .unwrap(),
    );

    assert_eq!(segments["start"]["record_count"], 2);
    assert_eq!(segments["all"]["record_count"], 3);
    assert_eq!(segments["empty"]["record_count"], 0);
    assert_eq!(segments["start"]["records"][0]["data"]["target"], "button#save");
    assert_eq!(
        segments["start"]["records"][0]["id"],
        segments["all"]["records"][0]["id"]
    );
}

/// An invalid record aborts the run unless skipping is requested.
#[test]
fn test_invalid_record_fails_by_default() {
    let temp = TempDir::new().unwrap();
    let logs = write_logs(temp.path(), &[CLICK, MISSING_SESSION, SCROLL]);

    let output = distill(temp.path()).arg("ids").arg(&logs).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("record 1 rejected"), "stderr: {stderr}");
}

#[test]
fn test_skip_invalid_reports_rejected_records() {
    let temp = TempDir::new().unwrap();
    let logs = write_logs(temp.path(), &[CLICK, MISSING_SESSION, "not json", SCROLL]);

    let output = distill(temp.path())
        .arg("ids")
        .arg(&logs)
        .arg("--skip-invalid")
        .arg("--json")
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let entries = stdout_json(&output);
    assert_eq!(entries.as_array().unwrap().len(), 2);
    assert!(stderr.contains("warning: record 1 rejected"), "stderr: {stderr}");
    assert!(stderr.contains("warning: record 2 rejected"), "stderr: {stderr}");
}

/// The skip policy can also come from a config file.
#[test]
fn test_config_file_sets_invalid_policy() {
    let temp = TempDir::new().unwrap();
    let logs = write_logs(temp.path(), &[CLICK, MISSING_SESSION]);
    let config_file = temp.path().join("distill.toml");
    std::fs::write(&config_file, "on_invalid = \"skip\"\n").unwrap();

    let output = distill(temp.path())
        .arg("--config")
        .arg(&config_file)
        .arg("ids")
        .arg(&logs)
        .output()
        .unwrap();
    assert!(output.status.success());
}

/// Only variables set on the command reach the binary.
#[test]
fn test_schema_env_override_is_explicit() {
    let temp = TempDir::new().unwrap();
    let logs = write_logs(temp.path(), &[r#"{"user":"u1","ts":5,"kind":"nav"}"#]);

    let rejected = distill(temp.path()).arg("ids").arg(&logs).output().unwrap();
    assert!(!rejected.status.success(), "UserALE schema is the default");

    let entries = stdout_json(
        &distill(temp.path())
            .env("DISTILL_SCHEMA__KIND", "fields")
            .env("DISTILL_SCHEMA__SESSION_FIELD", "user")
            .env("DISTILL_SCHEMA__TIME_FIELD", "ts")
            .env("DISTILL_SCHEMA__TYPE_FIELD", "kind")
            .arg("ids")
            .arg(&logs)
            .arg("--json")
            .output()
            .unwrap(),
    );
    assert_eq!(entries[0]["key"], "u1:5:nav:0");
}

/// A field schema reads custom field names and time units.
#[test]
fn test_field_schema_from_config() {
    let temp = TempDir::new().unwrap();
    let logs = write_logs(
        temp.path(),
        &[
            r#"{"user":"u1","ts":2.5,"kind":"nav","page":"/home"}"#,
            r#"{"user":"u1","ts":1,"kind":"nav","page":"/login"}"#,
        ],
    );
    let config_file = temp.path().join("distill.toml");
    std::fs::write(
        &config_file,
        r#"
[schema]
kind = "fields"
session_field = "user"
time_field = "ts"
type_field = "kind"
time_unit = "seconds"
"#,
    )
    .unwrap();

    let entries = stdout_json(
        &distill(temp.path())
            .arg("--config")
            .arg(&config_file)
            .arg("ids")
            .arg(&logs)
            .arg("--json")
            .output()
            .unwrap(),
    );
    assert_eq!(entries[0]["timestamp"], 1000);
    assert_eq!(entries[1]["timestamp"], 2500);
    assert_eq!(entries[0]["key"], "u1:1:nav:1");
}

/// Gaps reads a JSON array from stdin.
#[test]
fn test_gaps_from_stdin() {
    let temp = TempDir::new().unwrap();
    let input = format!("[{CLICK},{SCROLL},{LATE_CLICK}]");

    let mut child = distill(temp.path())
        .args(["gaps", "-", "--min-gap-ms", "1000", "--json"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let segments = stdout_json(&output);
    let gap = &segments["gap1"];
    assert_eq!(gap["time_range"]["start"], 1500);
    assert_eq!(gap["time_range"]["end"], 9000);
    assert_eq!(gap["record_count"], 2);
    assert!(segments.get("gap2").is_none());
}

#[test]
fn test_around_matching_records() {
    let temp = TempDir::new().unwrap();
    let logs = write_logs(temp.path(), &[CLICK, SCROLL, LATE_CLICK]);

    let segments = stdout_json(
        &distill(temp.path())
            .arg("around")
            .arg(&logs)
            .args(["--field", "type", "--value", "click"])
            .args(["--after-ms", "600", "--label", "click"])
            .arg("--json")
            .output()
            .unwrap(),
    );
    assert_eq!(segments["click1"]["record_count"], 2);
    assert_eq!(segments["click2"]["record_count"], 1);
}

/// Duplicate window names are rejected unless overwriting is configured.
#[test]
fn test_duplicate_window_names() {
    let temp = TempDir::new().unwrap();
    let logs = write_logs(temp.path(), &[CLICK, SCROLL]);
    let args = ["--window", "a=0..1000", "--window", "a=1200..2000", "--json"];

    let output = distill(temp.path())
        .arg("segment")
        .arg(&logs)
        .args(args)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("duplicate segment name `a`"), "stderr: {stderr}");

    let segments = stdout_json(
        &distill(temp.path())
            .env("DISTILL_DUPLICATE_SEGMENT_NAMES", "overwrite")
            .arg("segment")
            .arg(&logs)
            .args(args)
            .output()
            .unwrap(),
    );
    assert_eq!(segments["a"]["time_range"]["start"], 1200);
    assert_eq!(segments["a"]["record_count"], 1);
}

#[test]
fn test_inverted_window_is_an_error() {
    let temp = TempDir::new().unwrap();
    let logs = write_logs(temp.path(), &[CLICK]);

    let output = distill(temp.path())
        .arg("segment")
        .arg(&logs)
        .args(["--window", "back=2000..1000"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("window `back`"), "stderr: {stderr}");
}

#[test]
fn test_missing_file_is_an_error() {
    let temp = TempDir::new().unwrap();

    let output = distill(temp.path())
        .arg("ids")
        .arg(temp.path().join("nope.jsonl"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read"), "stderr: {stderr}");
}
