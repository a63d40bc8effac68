//! Corruption recovery tests for the lift binary.
//!
//! These tests verify the system can handle:
//! - Corrupted streak state
//! - Corrupted or partially written journals
//! - A corrupted or inconsistent workout library
//! - A bad configuration file

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write as IoWrite;
use std::path::Path;
use tempfile::TempDir;

fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("lift"));
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

fn run_session(data_dir: &Path) -> assert_cmd::assert::Assert {
    cli(data_dir)
        .arg("start")
        .arg("core_quick")
        .arg("--auto-complete")
        .arg("--tick-millis")
        .arg("1")
        .assert()
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_corrupted_state_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    fs::create_dir_all(data_dir.join("journal")).unwrap();
    let state_path = data_dir.join("journal/users.json");
    fs::write(&state_path, "{ invalid json }}}}").expect("Failed to write corrupted state");

    cli(&data_dir)
        .arg("streak")
        .assert()
        .success()
        .stdout(predicate::str::contains("Current streak: 0 days"));

    // A completed session rewrites the state from scratch
    run_session(&data_dir).success();

    let state_content = fs::read_to_string(&state_path).expect("Failed to read state");
    let parsed: serde_json::Value =
        serde_json::from_str(&state_content).expect("State should be valid JSON again");
    assert!(parsed["streaks"].is_object());
}

#[test]
fn test_partial_wal_line() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    run_session(&data_dir).success();

    // Simulate a crash in the middle of an append
    let wal_path = data_dir.join("journal/sessions.wal");
    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(&wal_path)
        .expect("Failed to open WAL");
    write!(file, "{{\"id\": \"trunc").expect("Failed to write partial line");
    drop(file);

    // Rollup skips the torn line and keeps the good session
    cli(&data_dir)
        .arg("rollup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled up 1 sessions"));
}

#[test]
fn test_corrupted_wal_only() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    fs::create_dir_all(data_dir.join("journal")).unwrap();
    fs::write(
        data_dir.join("journal/sessions.wal"),
        "{ invalid json }\n{ more invalid }",
    )
    .expect("Failed to write corrupted WAL");

    cli(&data_dir)
        .arg("rollup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled up 0 sessions"));

    assert!(!data_dir.join("sessions.csv").exists());
}

#[test]
fn test_corrupted_workout_library() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    fs::write(data_dir.join("workouts.json"), "[{ not a workout").unwrap();

    cli(&data_dir).arg("list").assert().failure();
    run_session(&data_dir)
        .failure()
        .stderr(predicate::str::contains("storage failure"));
}

#[test]
fn test_inconsistent_workout_library_reported() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    fs::write(
        data_dir.join("workouts.json"),
        r#"[{"id": "timed", "name": "Timed", "exercises": [
            {"id": "hold", "name": "Hold", "type": "DURATION", "sets": [{"id": 1}]}
        ]}]"#,
    )
    .unwrap();

    cli(&data_dir)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no duration"));
}

#[test]
fn test_invalid_config_rejected() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[session]\ntick_millis = \"fast\"\n").unwrap();

    cli(temp_dir.path())
        .arg("--config")
        .arg(&config_path)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Toml"));
}

#[test]
fn test_empty_files() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    fs::create_dir_all(data_dir.join("journal")).unwrap();
    fs::write(data_dir.join("journal/sessions.wal"), "").unwrap();
    fs::write(data_dir.join("journal/users.json"), "").unwrap();

    run_session(&data_dir).success();
    cli(&data_dir)
        .arg("streak")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total workouts: 1"));
}
