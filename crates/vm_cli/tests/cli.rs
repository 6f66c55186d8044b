use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn inputs(dir: &Path, candidates: &str, ballots: &str) -> (PathBuf, PathBuf) {
    let c = dir.join("candidates.txt");
    let b = dir.join("votes.csv");
    fs::write(&c, candidates).unwrap();
    fs::write(&b, ballots).unwrap();
    (c, b)
}

fn vm() -> Command {
    let mut cmd = Command::cargo_bin("vm").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn prints_rounds_and_winners() {
    let dir = tempfile::tempdir().unwrap();
    let (c, b) = inputs(dir.path(), "A\nB\nC\n", "Voter,1,2\nv1,A,B\nv2,A,C\nv3,B,A\n");
    vm().arg(&c)
        .arg(&b)
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Round 1 vote counts:"))
        .stdout(predicate::str::contains("A: 2.0 | B: 1.0 | C: 0.0 |"))
        .stdout(predicate::str::contains("A has won with 2.0 votes."))
        .stdout(predicate::str::ends_with("Winners:\nA\n"));
}

#[test]
fn seeded_run_writes_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let (c, b) = inputs(dir.path(), "A\nB\nC\n", "h\n1,A,B\n2,B,A\n");
    let out = dir.path().join("out");
    vm().args([c.as_os_str(), b.as_os_str()])
        .args(["1", "--seed", "0x2a", "--quiet", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let run: serde_json::Value = serde_json::from_slice(&fs::read(out.join("run_record.json")).unwrap()).unwrap();
    assert_eq!(run["tie"]["seed"], 42);
    assert_eq!(run["tie"]["random_draws"], 1);
    assert!(out.join("result.json").is_file());
}

#[test]
fn json_report() {
    let dir = tempfile::tempdir().unwrap();
    let (c, b) = inputs(dir.path(), "A\nB\n", "h\n1,A\n2,A\n3,B\n");
    let output = vm().arg(&c).arg(&b).args(["1", "--render", "json", "--seed", "1"]).output().unwrap();
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["winners"], serde_json::json!(["A"]));
    assert_eq!(v["integrity"]["tie_seed"], 1);
}

#[test]
fn seat_count_errors_exit_2() {
    let dir = tempfile::tempdir().unwrap();
    let (c, b) = inputs(dir.path(), "A\nB\n", "h\n1,A\n");
    vm().arg(&c)
        .arg(&b)
        .arg("3")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("The number of winners must be at least 1"));
    vm().arg(&c)
        .arg(&b)
        .arg("x")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid winner count argument"));
}

#[test]
fn missing_inputs_exit_4() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.txt");
    vm().arg(&missing).arg(&missing).arg("1").assert().code(4);
}

#[test]
fn no_arguments_is_usage_error() {
    vm().assert().code(2).stderr(predicate::str::contains("--manifest"));
}

#[test]
fn validate_only_with_manifest() {
    let dir = tempfile::tempdir().unwrap();
    inputs(dir.path(), "A\nB\n", "h\n1,A,Z\n");
    let m = dir.path().join("election.json");
    fs::write(&m, r#"{"candidates_path":"candidates.txt","ballots_path":"votes.csv","seats":1}"#).unwrap();
    vm().arg("--manifest")
        .arg(&m)
        .arg("--validate-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("inputs OK (1 warning(s))"));
    vm().arg("--manifest").arg(&m).args(["--seats", "5", "--validate-only"]).assert().code(2);
}
