//! Integration tests for the folio CLI commands.
#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ORCHARD: &str = r#"// A small orchard.
[apple=red,green]
?apple=red[:eat]
"Crunch."
!apple-=red
!apple+=bitten

[basket=#2]
[:look] "A basket."
"#;

/// Create a temp directory holding `orchard.folio`.
fn test_story() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("orchard.folio");
    fs::write(&path, ORCHARD).unwrap();
    (dir, path)
}

fn folio() -> Command {
    Command::cargo_bin("folio").unwrap()
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_valid_story() {
    let (_dir, story) = test_story();
    folio()
        .arg("check")
        .arg(&story)
        .assert()
        .success()
        .stdout(predicate::str::contains("All checks passed"))
        .stdout(predicate::str::contains("2 pages, 2 verbs, 0 patterns"));
}

#[test]
fn check_reports_errors() {
    let dir = TempDir::new().unwrap();
    let story = dir.path().join("broken.folio");
    fs::write(&story, "[apple]\n[apple]\n").unwrap();
    folio()
        .arg("check")
        .arg(&story)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate noun"))
        .stderr(predicate::str::contains("story has errors"));
}

#[test]
fn check_missing_file() {
    folio()
        .args(["check", "/nonexistent/story.folio"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

// ---------------------------------------------------------------------------
// pages
// ---------------------------------------------------------------------------

#[test]
fn pages_lists_nouns_verbs_and_defaults() {
    let (_dir, story) = test_story();
    folio()
        .arg("pages")
        .arg(&story)
        .assert()
        .success()
        .stdout(predicate::str::contains("apple"))
        .stdout(predicate::str::contains("eat"))
        .stdout(predicate::str::contains("red, green"))
        .stdout(predicate::str::contains("basket"))
        .stdout(predicate::str::contains("2 pages"));
}

// ---------------------------------------------------------------------------
// export
// ---------------------------------------------------------------------------

#[test]
fn export_json_to_stdout() {
    let (_dir, story) = test_story();
    folio()
        .arg("export")
        .arg(&story)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"apple\""))
        .stdout(predicate::str::contains("\"visual_name\": \"eat\""));
}

#[test]
fn export_json_to_file() {
    let (dir, story) = test_story();
    let out = dir.path().join("orchard.json");
    folio()
        .arg("export")
        .arg(&story)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported to"));

    let json = fs::read_to_string(&out).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["pages"].as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// read
// ---------------------------------------------------------------------------

#[test]
fn read_runs_one_verb() {
    let (_dir, story) = test_story();
    folio()
        .arg("read")
        .arg(&story)
        .args(["apple", "eat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Crunch."));
}

#[test]
fn read_unknown_verb_fails() {
    let (_dir, story) = test_story();
    folio()
        .arg("read")
        .arg(&story)
        .args(["apple", "throw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("verb not found: [apple:throw]"));
}

#[test]
fn read_continues_a_session() {
    let (dir, story) = test_story();
    let session = dir.path().join("run.session");

    folio()
        .arg("read")
        .arg(&story)
        .args(["apple", "eat", "--session"])
        .arg(&session)
        .assert()
        .success()
        .stdout(predicate::str::contains("Crunch."));
    assert!(session.exists());

    // the apple is no longer red, so the guard fails
    folio()
        .arg("read")
        .arg(&story)
        .args(["apple", "eat", "--session"])
        .arg(&session)
        .assert()
        .success()
        .stdout(predicate::str::contains("Crunch.").not());

    folio()
        .arg("history")
        .arg(&session)
        .assert()
        .success()
        .stdout(predicate::str::contains("orchard"))
        .stdout(predicate::str::contains("apple:eat"))
        .stdout(predicate::str::contains("2 actions, 0 bookmarks"));
}

// ---------------------------------------------------------------------------
// play
// ---------------------------------------------------------------------------

#[test]
fn play_lists_verbs_acts_and_undoes() {
    let (_dir, story) = test_story();
    folio()
        .arg("play")
        .arg(&story)
        .write_stdin("apple\napple eat\napple\nundo\napple\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pages: apple, basket"))
        .stdout(predicate::str::contains("apple: eat"))
        .stdout(predicate::str::contains("Crunch."))
        .stdout(predicate::str::contains("Nothing to do with apple."))
        .stdout(predicate::str::contains("Back to the start."));
}

#[test]
fn play_reports_unknown_pages() {
    let (_dir, story) = test_story();
    folio()
        .arg("play")
        .arg(&story)
        .write_stdin("pear eat\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("page not found: [pear]"));
}

#[test]
fn play_saves_bookmarks() {
    let (dir, story) = test_story();
    let session = dir.path().join("play.session");
    folio()
        .arg("play")
        .arg(&story)
        .arg("--session")
        .arg(&session)
        .write_stdin("basket:look\nbookmark first look\nsave\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("A basket."))
        .stdout(predicate::str::contains("Bookmarked: first look"))
        .stdout(predicate::str::contains("Saved to"));

    folio()
        .arg("history")
        .arg(&session)
        .assert()
        .success()
        .stdout(predicate::str::contains("basket:look"))
        .stdout(predicate::str::contains("first look"))
        .stdout(predicate::str::contains("1 action, 1 bookmark"));
}

#[test]
fn play_save_without_a_file() {
    let (_dir, story) = test_story();
    folio()
        .arg("play")
        .arg(&story)
        .write_stdin("save\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("No session file"));
}

// ---------------------------------------------------------------------------
// history
// ---------------------------------------------------------------------------

#[test]
fn history_rejects_malformed_sessions() {
    let dir = TempDir::new().unwrap();
    let session = dir.path().join("bad.session");
    fs::write(&session, "name\nnot a number\n").unwrap();
    folio()
        .arg("history")
        .arg(&session)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot load session"));
}

#[test]
fn help_lists_commands() {
    folio()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("play"))
        .stdout(predicate::str::contains("history"));
}
