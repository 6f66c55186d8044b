//! Loader: read the candidate list and the ballot CSV from local files,
//! normalize whitespace, and hand typed records to the pipeline.
//!
//! Formats:
//! - candidates: one name per line; surrounding whitespace trimmed; blank lines ignored.
//! - ballots: CSV with a header row (skipped). Each row is `voter,pref1,pref2,...`;
//!   entries are trimmed and blank entries dropped. Entries that are not a
//!   valid candidate name (control characters, over-long) are set aside in
//!   `malformed` and the rest of the row is kept. A row carrying only the
//!   voter is an empty ballot and still counts toward the total.
//!
//! No network I/O; no knowledge of counting rules.

#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use vm_core::ids::CandidateId;

use crate::{hasher, IoError};

const BOM: char = '\u{feff}';

/// One CSV row after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BallotRecord {
    /// 1-based line in the source file.
    pub line: usize,
    pub voter: String,
    pub preferences: Vec<CandidateId>,
    /// Entries dropped because they are not a valid name, as written.
    pub malformed: Vec<String>,
}

/// SHA-256 (lowercase hex) of the raw input files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputDigests {
    pub candidates_sha256: String,
    pub ballots_sha256: String,
}

#[derive(Debug, Clone)]
pub struct LoadedElection {
    pub candidates: Vec<CandidateId>,
    pub ballots: Vec<BallotRecord>,
    pub digests: InputDigests,
    pub candidates_path: PathBuf,
    pub ballots_path: PathBuf,
}

impl LoadedElection {
    /// Preference lists in file order, ready for the counting core.
    pub fn preference_lists(&self) -> Vec<Vec<CandidateId>> {
        self.ballots.iter().map(|b| b.preferences.clone()).collect()
    }
}

fn read_text(path: &Path) -> Result<String, IoError> {
    fs::read_to_string(path).map_err(|e| IoError::Read {
        path: path.display().to_string(),
        msg: e.to_string(),
    })
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix(BOM).unwrap_or(text)
}

/// Parse candidate-list text. Duplicate names are rejected.
pub fn parse_candidates(text: &str) -> Result<Vec<CandidateId>, IoError> {
    let mut out: Vec<CandidateId> = Vec::new();
    for (i, raw) in strip_bom(text).lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let id = CandidateId::new(raw).map_err(|e| {
            IoError::Invalid(format!("candidates line {}: {e}: {:?}", i + 1, raw.trim()))
        })?;
        if out.contains(&id) {
            return Err(IoError::Invalid(format!(
                "candidates line {}: duplicate candidate {id}",
                i + 1
            )));
        }
        out.push(id);
    }
    Ok(out)
}

/// Parse ballot CSV text. The first line is a header and is never counted.
pub fn parse_ballots(text: &str) -> Result<Vec<BallotRecord>, IoError> {
    let mut out = Vec::new();
    for (i, raw) in strip_bom(text).lines().enumerate().skip(1) {
        if raw.trim().is_empty() {
            continue;
        }
        let line = i + 1;
        let mut fields = raw.split(',');
        let voter = fields.next().unwrap_or_default().trim().to_owned();
        let mut malformed = Vec::new();
        let preferences: Vec<CandidateId> = fields
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .filter_map(|f| match CandidateId::new(f) {
                Ok(id) => Some(id),
                Err(_) => {
                    malformed.push(f.to_owned());
                    None
                }
            })
            .collect();
        if !malformed.is_empty() {
            tracing::debug!(line, dropped = malformed.len(), "malformed ballot entries set aside");
        }
        out.push(BallotRecord { line, voter, preferences, malformed });
    }
    Ok(out)
}

pub fn load_candidates(path: &Path) -> Result<Vec<CandidateId>, IoError> {
    parse_candidates(&read_text(path)?)
}

pub fn load_ballots(path: &Path) -> Result<Vec<BallotRecord>, IoError> {
    parse_ballots(&read_text(path)?)
}

/// Read both inputs and digest their raw bytes.
pub fn load_election(candidates_path: &Path, ballots_path: &Path) -> Result<LoadedElection, IoError> {
    let candidates = load_candidates(candidates_path)?;
    let ballots = load_ballots(ballots_path)?;
    let digests = InputDigests {
        candidates_sha256: hasher::sha256_file(candidates_path)?,
        ballots_sha256: hasher::sha256_file(ballots_path)?,
    };
    tracing::debug!(
        candidates = candidates.len(),
        ballots = ballots.len(),
        "inputs loaded"
    );
    Ok(LoadedElection {
        candidates,
        ballots,
        digests,
        candidates_path: candidates_path.to_path_buf(),
        ballots_path: ballots_path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(ids: &[CandidateId]) -> Vec<&str> {
        ids.iter().map(|c| c.as_str()).collect()
    }

    #[test]
    fn candidates_trimmed_blank_lines_skipped() {
        let got = parse_candidates("\u{feff}Alice\n  Bob  \n\n\t\nCarol\r\n").unwrap();
        assert_eq!(names(&got), ["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn duplicate_candidate_rejected() {
        let err = parse_candidates("A\nB\n A \n").unwrap_err();
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn header_skipped_and_fields_trimmed() {
        let csv = "Voter,First,Second,Third\nann, A , B,\nbob,,C\ncat\n\ndan, , \n";
        let got = parse_ballots(csv).unwrap();
        assert_eq!(got.len(), 4);
        assert_eq!(got[0].voter, "ann");
        assert_eq!(names(&got[0].preferences), ["A", "B"]);
        assert_eq!(names(&got[1].preferences), ["C"]);
        assert!(got[2].preferences.is_empty());
        assert_eq!(got[3].line, 6);
        assert!(got[3].preferences.is_empty());
    }

    #[test]
    fn header_only_means_no_ballots() {
        assert!(parse_ballots("Voter,1,2\n").unwrap().is_empty());
        assert!(parse_ballots("").unwrap().is_empty());
    }

    #[test]
    fn malformed_entry_leaves_rest_of_ballot() {
        let long = "x".repeat(300);
        let csv = format!("voter,1,2,3\nann,A,B\u{7}x,C\nbob,{long}\n");
        let got = parse_ballots(&csv).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(names(&got[0].preferences), ["A", "C"]);
        assert_eq!(got[0].malformed, ["B\u{7}x"]);
        assert!(got[1].preferences.is_empty());
        assert_eq!(got[1].malformed.len(), 1);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = load_candidates(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, IoError::Read { .. }));
    }

    #[test]
    fn load_election_digests_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let c = dir.path().join("candidates.txt");
        let b = dir.path().join("votes.csv");
        fs::write(&c, "A\nB\n").unwrap();
        fs::write(&b, "name,1,2\nx,A,B\ny,B\n").unwrap();

        let loaded = load_election(&c, &b).unwrap();
        assert_eq!(loaded.digests.candidates_sha256, hasher::sha256_hex(b"A\nB\n"));
        assert_eq!(loaded.preference_lists().len(), 2);
        assert_eq!(loaded.preference_lists()[1], vec![CandidateId::new("B").unwrap()]);
    }
}
