//! Integration tests for the wktc binary.
//!
//! These tests verify end-to-end behavior including:
//! - YAML and JSON descriptions compiling to a handoff document
//! - Repeat controller vs unrolled output
//! - Error presentation with the offending node path
//! - Config file handling and the CSV record table

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const HILL_REPEATS: &str = r#"
version: 1
metadata:
  name: "Hill Repeats!"
  description: Six hills with an easy jog back down.
  sport: running
steps:
  - name: Warm up
    intensity: warmup
    duration: { value: 10, unit: min }
  - repeat: 6
    children:
      - name: Hill
        intensity: interval
        duration: { value: 90, unit: s }
        target: { type: heart_rate_range, low: 150, high: 170 }
      - name: Jog down
        intensity: rest
        duration: { open: true }
  - name: Cool down
    intensity: cooldown
    duration: { value: 2, unit: km }
"#;

/// Helper to create a test directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
///
/// Points the config lookup at an empty directory so a developer's own
/// config never leaks into the tests.
fn cli(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("wktc"));
    cmd.env("XDG_CONFIG_HOME", temp_dir.path().join("xdg"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write test file");
    path
}

fn read_json(path: &Path) -> serde_json::Value {
    let contents = fs::read_to_string(path).expect("Failed to read output");
    serde_json::from_str(&contents).expect("Output is not valid JSON")
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Structured workout compiler"));
}

#[test]
fn test_compile_writes_handoff() {
    let temp_dir = setup_test_dir();
    let input = write_file(temp_dir.path(), "hills.yaml", HILL_REPEATS);
    let out_dir = temp_dir.path().join("out");

    cli(&temp_dir)
        .arg("compile")
        .arg(&input)
        .arg("--out")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Hill Repeats"))
        .stdout(predicate::str::contains("Repeat controllers: 1"))
        .stdout(predicate::str::contains("Wrote"));

    let handoff = read_json(&out_dir.join("Hill_Repeats.json"));
    assert_eq!(handoff["file_id"]["file_type"], "workout");
    assert_eq!(handoff["file_id"]["product"], 65534);

    let workout = &handoff["workout"];
    assert_eq!(workout["header"]["name"], "Hill Repeats");
    assert_eq!(workout["header"]["num_valid_steps"], 5);

    let records = workout["records"].as_array().unwrap();
    assert_eq!(records.len(), 5);
    assert_eq!(records[0]["duration_value"], 600_000);
    assert_eq!(records[1]["name"], "Hill");
    assert_eq!(records[1]["duration_value"], 90_000);
    assert_eq!(records[1]["target"]["custom_low"], 250);
    assert_eq!(records[1]["target"]["custom_high"], 270);
    assert_eq!(records[3]["kind"], "repeat_controller");
    assert_eq!(records[3]["start_index"], 1);
    assert_eq!(records[3]["total_repeats"], 6);
    assert_eq!(records[3]["repeat_value"], 6);
    assert_eq!(records[4]["duration_value"], 200_000);

    let description_chunks = workout["description_chunks"].as_array().unwrap();
    assert_eq!(description_chunks.len(), 1);
}

#[test]
fn test_compile_json_input() {
    let temp_dir = setup_test_dir();
    let input = write_file(
        temp_dir.path(),
        "easy.json",
        r#"{"metadata": {"name": "Easy Run"},
            "steps": [{"name": "Run", "duration": {"value": 5, "unit": "km"}}]}"#,
    );

    cli(&temp_dir)
        .arg("compile")
        .arg(&input)
        .arg("--out")
        .arg(temp_dir.path())
        .assert()
        .success();

    let handoff = read_json(&temp_dir.path().join("Easy_Run.json"));
    let records = handoff["workout"]["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["duration_kind"], "distance");
    assert_eq!(records[0]["duration_value"], 500_000);
}

#[test]
fn test_config_unroll_default() {
    let temp_dir = setup_test_dir();
    let input = write_file(temp_dir.path(), "hills.yaml", HILL_REPEATS);
    let config = write_file(
        temp_dir.path(),
        "config.toml",
        "[defaults]\nrepeat_mode = \"unroll\"\n",
    );

    cli(&temp_dir)
        .arg("compile")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .arg("--out")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Steps: 14"))
        .stdout(predicate::str::contains("Repeat controllers: 0"));

    let handoff = read_json(&temp_dir.path().join("Hill_Repeats.json"));
    let records = handoff["workout"]["records"].as_array().unwrap();
    assert_eq!(records.len(), 14);
    assert!(records.iter().all(|r| r["kind"] == "step"));
}

#[test]
fn test_output_dir_from_config() {
    let temp_dir = setup_test_dir();
    let input = write_file(temp_dir.path(), "hills.yaml", HILL_REPEATS);
    let out_dir = temp_dir.path().join("from_config");
    let config = write_file(
        temp_dir.path(),
        "config.toml",
        &format!("[output]\ndir = {:?}\n", out_dir.to_string_lossy()),
    );

    cli(&temp_dir)
        .arg("compile")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert!(out_dir.join("Hill_Repeats.json").exists());
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = setup_test_dir();
    let input = write_file(temp_dir.path(), "hills.yaml", HILL_REPEATS);
    let config = write_file(
        temp_dir.path(),
        "config.toml",
        "[capacities]\nchunk_payload = 2\n",
    );

    cli(&temp_dir)
        .arg("check")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("chunk_payload"));
}

#[test]
fn test_check_reports_error_path() {
    let temp_dir = setup_test_dir();
    let broken = HILL_REPEATS.replace("low: 150, high: 170", "low: 170, high: 150");
    let input = write_file(temp_dir.path(), "broken.yaml", &broken);

    cli(&temp_dir)
        .arg("check")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "error at steps[1].children[0].target",
        ))
        .stderr(predicate::str::contains("invalid range"));
}

#[test]
fn test_missing_steps_section() {
    let temp_dir = setup_test_dir();
    let input = write_file(temp_dir.path(), "empty.yaml", "metadata:\n  name: Nothing\n");

    cli(&temp_dir)
        .arg("compile")
        .arg(&input)
        .arg("--out")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "error at steps: missing required section 'steps'",
        ));

    assert!(!temp_dir.path().join("Nothing.json").exists());
}

#[test]
fn test_check_valid_file() {
    let temp_dir = setup_test_dir();
    let input = write_file(temp_dir.path(), "hills.yaml", HILL_REPEATS);

    cli(&temp_dir)
        .arg("check")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp_dir = setup_test_dir();
    let input = write_file(temp_dir.path(), "hills.yaml", HILL_REPEATS);
    let out_dir = temp_dir.path().join("out");

    cli(&temp_dir)
        .arg("compile")
        .arg(&input)
        .arg("--out")
        .arg(&out_dir)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    assert!(!out_dir.exists());
}

#[test]
fn test_csv_format() {
    let temp_dir = setup_test_dir();
    let input = write_file(temp_dir.path(), "hills.yaml", HILL_REPEATS);
    let config = write_file(
        temp_dir.path(),
        "config.toml",
        "[repeat]\ncontroller_count = \"additional\"\n",
    );

    cli(&temp_dir)
        .arg("compile")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .arg("--format")
        .arg("csv")
        .arg("--out")
        .arg(temp_dir.path())
        .assert()
        .success();

    let csv_path = temp_dir.path().join("Hill_Repeats.csv");
    let content = fs::read_to_string(&csv_path).expect("Failed to read CSV");
    let lines: Vec<&str> = content.lines().collect();

    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("index,kind,name"));
    assert!(lines[4].starts_with("3,repeat,,,6,1,2,5,"));
    assert!(!temp_dir.path().join("Hill_Repeats.json").exists());
}

#[test]
fn test_controller_count_in_handoff() {
    let temp_dir = setup_test_dir();
    let input = write_file(temp_dir.path(), "hills.yaml", HILL_REPEATS);
    let config = write_file(
        temp_dir.path(),
        "config.toml",
        "[repeat]\ncontroller_count = \"additional\"\n",
    );

    cli(&temp_dir)
        .arg("compile")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .arg("--out")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("6 total, encoded 5"));

    let handoff = read_json(&temp_dir.path().join("Hill_Repeats.json"));
    let controller = &handoff["workout"]["records"][3];
    assert_eq!(controller["kind"], "repeat_controller");
    assert_eq!(controller["total_repeats"], 6);
    assert_eq!(controller["repeat_value"], 5);

    let chunk = &handoff["workout"]["description_chunks"][0];
    assert_eq!(chunk["mesg_num"], 26);
    assert_eq!(chunk["field_num"], 17);
}

#[test]
fn test_unreadable_yaml() {
    let temp_dir = setup_test_dir();
    let input = write_file(temp_dir.path(), "bad.yaml", "steps: [unclosed\n");

    cli(&temp_dir)
        .arg("check")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("YAML error"));
}
