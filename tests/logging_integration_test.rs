// Integration tests for logging output of the notifly binary
use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn notifly() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_notifly"));
    command.env("NOTIFLY_CONFIG", "/nonexistent/notifly.toml");
    command
}

#[test]
fn test_text_log_lines_have_timestamp_and_level() {
    let output = notifly()
        .args(["--verbose", "stress", "--topics", "1", "--observers", "1", "--posts", "1"])
        .output()
        .expect("Failed to execute notifly");
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let line = stderr
        .lines()
        .find(|line| line.contains("[DEBUG]"))
        .unwrap_or_else(|| panic!("no debug line in: {}", stderr));

    // YYYY-MM-DD HH:MM:SS [LEVEL] target: message
    let bytes = line.as_bytes();
    assert_eq!(bytes[4], b'-');
    assert_eq!(bytes[10], b' ');
    assert_eq!(bytes[13], b':');
    assert!(line.contains("notifly"));
}

#[test]
fn test_json_log_lines() {
    let output = notifly()
        .args(["--verbose", "--log-format", "json", "version"])
        .output()
        .expect("Failed to execute notifly");
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let entries: Vec<serde_json::Value> = stderr
        .lines()
        .filter(|line| line.starts_with('{'))
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert!(!entries.is_empty(), "no JSON log lines in: {}", stderr);
    for entry in entries {
        assert!(entry["timestamp"].is_string());
        assert!(entry["level"].is_string());
        assert!(entry["target"].is_string());
        assert!(entry["message"].is_string());
    }
}

#[test]
fn test_log_file_receives_worker_records() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("notifly.log");

    let output = notifly()
        .args(["--quiet", "--log-file"])
        .arg(&log_path)
        .args(["--log-file-level", "trace", "--log-format", "json"])
        .args(["stress", "--topics", "1", "--observers", "1", "--posts", "5", "--async"])
        .output()
        .expect("Failed to execute notifly");
    assert!(output.status.success());

    let contents = fs::read_to_string(&log_path).unwrap();
    assert!(
        contents.contains("notifly-worker-"),
        "expected records from worker threads in: {}",
        contents
    );
    // console stays quiet
    assert!(!String::from_utf8_lossy(&output.stderr).contains("[TRACE]"));
}
