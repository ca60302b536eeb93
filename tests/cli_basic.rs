//! Integration tests for basic CLI behavior.
//!
//! Tests that the binary exists, accepts standard flags, each subcommand
//! responds to `--help`, and the commands that need no external tools work
//! against a scratch config.

#![allow(deprecated)] // cargo_bin deprecation — replacement not yet stable

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper: get a Command for the `storyreel` binary.
fn storyreel() -> Command {
    Command::cargo_bin("storyreel").expect("binary 'storyreel' should be built")
}

/// Write a config that keeps every path inside `dir`.
fn scratch_config(dir: &Path, with_background: bool) -> PathBuf {
    scratch_config_with(dir, with_background, "")
}

/// Like [`scratch_config`], with `extra` TOML sections appended.
fn scratch_config_with(dir: &Path, with_background: bool, extra: &str) -> PathBuf {
    let background = dir.join("background.mp4");
    if with_background {
        std::fs::write(&background, b"placeholder").unwrap();
    }
    let config = format!(
        r#"
[paths]
store = "{}"
work_dir = "{}"
background_clip = "{}"

{extra}
"#,
        dir.join("items.json").display(),
        dir.join("work").display(),
        background.display()
    );
    let path = dir.join("config.toml");
    std::fs::write(&path, config).unwrap();
    path
}

fn write_items(dir: &Path) -> PathBuf {
    let long_body = vec!["word"; 400].join(" ");
    let items = format!(
        r#"[
  {{"source_id": "good1", "collection": "tifu", "title": "Short and sweet", "body": "I'm 17M and can't believe it.", "score": 950}},
  {{"source_id": "good2", "collection": "tifu", "title": "Another one", "body": "This one is fine too.", "score": 720}},
  {{"source_id": "lowscore", "collection": "tifu", "title": "Nobody cared", "body": "Short.", "score": 12}},
  {{"source_id": "toolong", "collection": "tifu", "title": "Way too long", "body": "{long_body}", "score": 990}}
]"#
    );
    let path = dir.join("items_in.json");
    std::fs::write(&path, items).unwrap();
    path
}

// ─── Top-level flags ─────────────────────────────────────────────────────────

#[test]
fn help_flag_shows_usage() {
    storyreel()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: storyreel"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("schedule"))
        .stdout(predicate::str::contains("select"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("prepare"))
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn worker_command_is_hidden() {
    storyreel()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process-item").not());
}

#[test]
fn version_flag_shows_semver() {
    storyreel()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^storyreel \d+\.\d+\.\d+\n$").unwrap());
}

#[test]
fn no_args_shows_error_and_usage() {
    storyreel()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: storyreel"));
}

#[test]
fn invalid_subcommand_fails() {
    storyreel()
        .arg("this-is-not-a-real-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// ─── Subcommand help ─────────────────────────────────────────────────────────

#[test]
fn generate_help() {
    storyreel()
        .args(["generate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("without publishing"))
        .stdout(predicate::str::contains("<ID>"))
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--seed"));
}

#[test]
fn prepare_help() {
    storyreel()
        .args(["prepare", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("synthesis chunks"))
        .stdout(predicate::str::contains("[TEXT]"))
        .stdout(predicate::str::contains("--title"));
}

#[test]
fn import_missing_file_fails() {
    storyreel()
        .arg("import")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<FILE>"));
}

// ─── Commands without external tools ─────────────────────────────────────────

#[test]
fn prepare_shows_both_renderings() {
    let dir = TempDir::new().unwrap();
    let config = scratch_config(dir.path(), false);

    storyreel()
        .arg("--config")
        .arg(&config)
        .args(["prepare", "I'm 17M and can't believe it. Edit: thanks all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("I'm 17M and can't believe it."))
        .stdout(predicate::str::contains("I am seventeen M and cannot believe it."))
        .stdout(predicate::str::contains("thanks all").not());
}

#[test]
fn prepare_reads_stdin() {
    let dir = TempDir::new().unwrap();
    let config = scratch_config(dir.path(), false);

    storyreel()
        .arg("--config")
        .arg(&config)
        .arg("prepare")
        .write_stdin("Read [this](http://x.com) please")
        .assert()
        .success()
        .stdout(predicate::str::contains("Read this please"))
        .stdout(predicate::str::contains("http").not());
}

#[test]
fn import_then_select_lists_eligible_items() {
    let dir = TempDir::new().unwrap();
    let config = scratch_config(dir.path(), false);
    let items = write_items(dir.path());

    storyreel()
        .arg("--config")
        .arg(&config)
        .arg("import")
        .arg(&items)
        .assert()
        .success()
        .stderr(predicate::str::contains("4 new"));
    assert!(dir.path().join("items.json").exists());

    let output = storyreel()
        .arg("--config")
        .arg(&config)
        .arg("select")
        .assert()
        .success()
        .stdout(predicate::str::contains("good1"))
        .stdout(predicate::str::contains("good2"))
        .stdout(predicate::str::contains("lowscore").not())
        .stdout(predicate::str::contains("toolong").not())
        .get_output()
        .stdout
        .clone();
    let listing = String::from_utf8(output).unwrap();
    assert!(listing.find("good1").unwrap() < listing.find("good2").unwrap());

    // re-import refreshes without adding
    storyreel()
        .arg("--config")
        .arg(&config)
        .arg("import")
        .arg(&items)
        .assert()
        .success()
        .stderr(predicate::str::contains("0 new"));
}

#[test]
fn run_without_background_aborts() {
    let dir = TempDir::new().unwrap();
    let config = scratch_config(dir.path(), false);

    storyreel()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Background clip not found"));
}

#[test]
fn missing_explicit_config_fails() {
    storyreel()
        .args(["--config", "/nonexistent/storyreel.toml", "select"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading config"));
}

#[test]
fn invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[narration]\nspeaking_rate = 0.0\n").unwrap();

    storyreel()
        .arg("--config")
        .arg(&path)
        .arg("select")
        .assert()
        .failure()
        .stderr(predicate::str::contains("speaking_rate"));
}

/// Files left anywhere under `dir`; a missing directory counts as empty.
fn files_under(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .map(|e| e.unwrap().path())
        .map(|p| if p.is_dir() { files_under(&p) } else { 1 })
        .sum()
}

fn stored_records(dir: &Path) -> Vec<serde_json::Value> {
    let content = std::fs::read_to_string(dir.join("items.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

// ─── Batches with a broken voice engine ──────────────────────────────────────

const MISSING_VOICE: &str = r#"
[synthesis]
program = "/nonexistent/tts"
args = ["{output}"]
"#;

#[test]
fn subprocess_batch_records_each_failure() {
    let dir = TempDir::new().unwrap();
    let extra = format!("[batch]\nisolation = \"subprocess\"\n{MISSING_VOICE}");
    let config = scratch_config_with(dir.path(), true, &extra);
    let items = write_items(dir.path());

    storyreel()
        .arg("--config")
        .arg(&config)
        .arg("import")
        .arg(&items)
        .assert()
        .success();

    storyreel()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .assert()
        .success()
        .stderr(predicate::str::contains("0 posted, 2 failed"));

    for record in stored_records(dir.path()) {
        let id = record["source_id"].as_str().unwrap();
        match id {
            "good1" | "good2" => {
                assert_eq!(record["generation_status"], "failed", "{id}");
                assert_eq!(record["attempts"], 1, "{id}");
                assert_eq!(record["posted"], false, "{id}");
                assert!(!record["generation_error"].as_str().unwrap().is_empty());
            }
            _ => {
                assert_eq!(record["generation_status"], "pending", "{id}");
                assert_eq!(record["attempts"], 0, "{id}");
            }
        }
    }
    assert_eq!(files_under(&dir.path().join("work")), 0);
}

#[test]
fn failed_generate_cleans_up_and_keeps_record() {
    let dir = TempDir::new().unwrap();
    let config = scratch_config_with(dir.path(), true, MISSING_VOICE);
    let items = write_items(dir.path());
    let output = dir.path().join("out").join("good1.mp4");

    storyreel()
        .arg("--config")
        .arg(&config)
        .arg("import")
        .arg(&items)
        .assert()
        .success();

    storyreel()
        .arg("--config")
        .arg(&config)
        .args(["generate", "good1", "--output"])
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("generating good1"));

    assert!(!output.exists());
    assert_eq!(files_under(&dir.path().join("work")), 0);
    let good1 = stored_records(dir.path())
        .into_iter()
        .find(|r| r["source_id"] == "good1")
        .unwrap();
    assert_eq!(good1["generation_status"], "pending");
    assert_eq!(good1["attempts"], 0);
}
