//! Full runs from files on disk to canonical artifacts.

use std::fs;
use std::path::Path;

use serde_json::Value;
use vm_pipeline::{
    run_from_source, write_artifacts, EventDoc, InputSource, PipelineError, RunOverrides,
};

const TS: &str = "2025-08-12T14:00:00Z";

fn write_inputs(dir: &Path, candidates: &str, ballots: &str) -> InputSource {
    let c = dir.join("candidates.txt");
    let b = dir.join("votes.csv");
    fs::write(&c, candidates).unwrap();
    fs::write(&b, ballots).unwrap();
    InputSource::Files { candidates: c, ballots: b }
}

#[test]
fn two_seat_count_writes_both_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_inputs(
        dir.path(),
        "Ann\nBob\nCat\nDan\n",
        "Voter,1,2,3\n\
         v1,Ann,Cat\nv2,Ann,Cat\nv3,Ann,Cat\nv4,Ann,Cat\nv5,Ann,Cat\n\
         v6,Bob\nv7,Bob,Dan\nv8,Dan,Bob\nv9,Cat\n",
    );
    let out = run_from_source(&src, RunOverrides { seats: Some(2), tie_seed: Some(1) }, TS).unwrap();
    assert_eq!(out.result.body.quota, 3.0);
    let winners: Vec<_> = out.result.body.winners.iter().map(|c| c.as_str()).collect();
    assert_eq!(winners, ["Ann", "Bob"]);
    assert!(out.validation.pass);

    let paths = write_artifacts(&dir.path().join("out"), &out).unwrap();
    let result: Value = serde_json::from_slice(&fs::read(&paths.result).unwrap()).unwrap();
    let run: Value = serde_json::from_slice(&fs::read(&paths.run_record).unwrap()).unwrap();
    assert_eq!(result["id"], Value::String(out.result.id.to_string()));
    assert_eq!(run["outputs"]["result_id"], result["id"]);
    assert_eq!(run["tie"]["seed"], 1);
    assert_eq!(run["timestamp_utc"], TS);
}

#[test]
fn same_inputs_same_seed_same_ids() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_inputs(dir.path(), "A\nB\nC\n", "h\n1,A,B\n2,B,A\n");
    let o = RunOverrides { seats: Some(1), tie_seed: Some(42) };
    let a = run_from_source(&src, o, TS).unwrap();
    let b = run_from_source(&src, o, TS).unwrap();
    assert_eq!(a.result.id, b.result.id);
    assert_eq!(a.run_record.id, b.run_record.id);

    // The random step ran once and C never wins.
    assert_eq!(a.run_record.body.tie.random_draws, 1);
    assert_ne!(a.result.body.winners[0].as_str(), "C");
    let tie_round = &a.result.body.rounds[1];
    assert!(matches!(&tie_round.events[0], EventDoc::TieBreak { resolved_by, .. } if resolved_by == "random"));
}

#[test]
fn seat_count_out_of_range_stops_before_counting() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_inputs(dir.path(), "A\nB\n", "h\n1,A\n");
    for seats in [0, 3] {
        let err = run_from_source(&src, RunOverrides { seats: Some(seats), tie_seed: None }, TS).unwrap_err();
        match err {
            PipelineError::Config(msg) => assert!(msg.contains("at least 1"), "{msg}"),
            other => panic!("expected config error, got {other}"),
        }
    }
}

#[test]
fn manifest_supplies_inputs_and_defaults() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), "A\nB\nC\n", "h\n1,A\n2,A\n3,B\n4,C,B\n");
    let m = dir.path().join("election.json");
    fs::write(
        &m,
        r#"{"candidates_path":"candidates.txt","ballots_path":"votes.csv","seats":1,"tie_seed":9}"#,
    )
    .unwrap();

    let out = run_from_source(&InputSource::Manifest(m), RunOverrides::default(), TS).unwrap();
    assert_eq!(out.run_record.body.tie.seed, 9);
    assert_eq!(out.result.body.total_ballots, 4);
    assert_eq!(out.result.body.winners.len(), 1);
}

#[test]
fn unreadable_input_is_ingest_error() {
    let dir = tempfile::tempdir().unwrap();
    let src = InputSource::Files {
        candidates: dir.path().join("missing.txt"),
        ballots: dir.path().join("missing.csv"),
    };
    let err = run_from_source(&src, RunOverrides { seats: Some(1), tie_seed: None }, TS).unwrap_err();
    assert!(matches!(err, PipelineError::Ingest(_)));
}

#[test]
fn malformed_ballot_entry_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let src = write_inputs(dir.path(), "A\nB\n", "voter,1,2\nann,A,B\u{7}x\nbob,B\ncat,A\n");
    let out = run_from_source(&src, RunOverrides { seats: Some(1), tie_seed: Some(0) }, TS).unwrap();
    assert_eq!(out.result.body.total_ballots, 3);
    assert_eq!(out.result.body.rounds[0].tally[0].total, 2.0);
    assert!(out.validation.warnings().any(|i| i.code == "malformed_preference"));
}
