//! End-to-end integration tests for the complete lap tracking flow.
//!
//! Tests the full pipeline: init → add → timesheet → recent → delete
//! through the compiled binary, with config pointed at a temp directory
//! via `LT_*` environment variables.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn lt_binary() -> String {
    env!("CARGO_BIN_EXE_lt").to_string()
}

fn lt(temp: &Path, args: &[&str]) -> Output {
    Command::new(lt_binary())
        .env("LT_DATABASE_PATH", temp.join("lt.db"))
        .env("LT_REFERENCE_DIR", temp.join("reference"))
        .args(args)
        .output()
        .expect("failed to run lt")
}

fn lt_ok(temp: &Path, args: &[&str]) -> String {
    let output = lt(temp, args);
    assert!(
        output.status.success(),
        "lt {args:?} should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout is utf-8")
}

fn init_tracks(temp: &Path) {
    let tracks = temp.join("tracks.csv");
    std::fs::write(
        &tracks,
        "1,Mushroom,New,Mario Kart Stadium,MKS\n2,Mushroom,New,Water Park,WP\n",
    )
    .unwrap();
    let stdout = lt_ok(temp, &["init", tracks.to_str().unwrap()]);
    assert!(stdout.contains("Loaded 2 tracks"));
}

fn write_reference_files(temp: &Path) {
    let reference = temp.join("reference");
    std::fs::create_dir_all(&reference).unwrap();
    std::fs::write(reference.join("150cc_shrooms_wrs.csv"), "1:38.000\n1:58.000*\n").unwrap();
    std::fs::write(
        reference.join("150cc_shrooms_standards.csv"),
        "Gold,Silver\n1:35.000,1:45.000\n1:55.000,2:05.000\n",
    )
    .unwrap();
}

#[test]
fn test_full_flow_to_timesheet_json() {
    let temp = TempDir::new().unwrap();
    init_tracks(temp.path());
    write_reference_files(temp.path());

    lt_ok(temp.path(), &["add", "Mario Kart Stadium", "1:40.000"]);
    lt_ok(temp.path(), &["add", "Mario Kart Stadium", "1:42.500"]);

    let stdout = lt_ok(temp.path(), &["timesheet", "--json"]);
    let payload: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    let rows = payload["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);

    // PB is the faster of the two recorded times
    assert_eq!(rows[0]["track_name"], "Mario Kart Stadium");
    assert_eq!(rows[0]["time"], "1:40.000");
    assert_eq!(rows[0]["standard"], "Silver");
    assert_eq!(rows[0]["wr_diff"], "0:02.000");

    // No PB and a *-flagged WR leave the second row empty
    assert_eq!(rows[1]["time"], serde_json::Value::Null);
    assert_eq!(rows[1]["wr"], serde_json::Value::Null);

    assert_eq!(payload["stats"]["total_time"], "0:01:40.000");
    assert_eq!(payload["stats"]["overall_rank"], "Silver");
}

#[test]
fn test_duplicate_add_is_reported_not_duplicated() {
    let temp = TempDir::new().unwrap();
    init_tracks(temp.path());

    let first = lt_ok(temp.path(), &["add", "Water Park", "2:01.500"]);
    assert!(first.starts_with("Recorded"));

    let second = lt_ok(temp.path(), &["add", "Water Park", "2:01.500"]);
    assert!(second.starts_with("Already recorded"));

    let recent = lt_ok(temp.path(), &["recent"]);
    assert_eq!(recent.lines().count(), 2, "header plus one entry:\n{recent}");
}

#[test]
fn test_add_to_unknown_track_fails() {
    let temp = TempDir::new().unwrap();
    init_tracks(temp.path());

    let output = lt(temp.path(), &["add", "Rainbow Road", "1:40.000"]);
    assert!(!output.status.success());
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("unknown track"),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_delete_by_id_from_recent() {
    let temp = TempDir::new().unwrap();
    init_tracks(temp.path());

    lt_ok(temp.path(), &["add", "Water Park", "2:01.500"]);
    let recent = lt_ok(temp.path(), &["recent"]);
    let entry_line = recent.lines().nth(1).expect("one entry");
    let id = entry_line
        .split_whitespace()
        .next()
        .expect("id column")
        .to_string();

    let stdout = lt_ok(temp.path(), &["delete", &id]);
    assert!(stdout.contains("Deleted"));

    let recent = lt_ok(temp.path(), &["recent"]);
    assert!(recent.contains("No times recorded."));
}

#[test]
fn test_timesheet_without_reference_files_still_renders() {
    let temp = TempDir::new().unwrap();
    init_tracks(temp.path());

    lt_ok(temp.path(), &["add", "Mario Kart Stadium", "1:40.000"]);

    let stdout = lt_ok(temp.path(), &["timesheet"]);
    assert!(stdout.contains("Mario Kart Stadium"));
    assert!(stdout.contains("Total time:   0:01:40.000"));
}

#[test]
fn test_track_improvement_sheet() {
    let temp = TempDir::new().unwrap();
    init_tracks(temp.path());

    lt_ok(temp.path(), &["add", "Water Park", "2:05.000"]);
    lt_ok(temp.path(), &["add", "Water Park", "2:01.500"]);

    let stdout = lt_ok(temp.path(), &["track", "Water Park"]);
    assert!(stdout.contains("2:01.500"));
    assert!(stdout.contains("0:03.500"));
}
