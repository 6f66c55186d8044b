//! crates/vm_pipeline/src/validate.rs
//! Checks run before any counting. Errors stop the run; warnings are logged
//! and echoed, and the count proceeds.
//!
//! - seats ∈ [1, candidate count]                  → error
//! - ballot entry naming no listed candidate        → warning (entry dropped)
//! - ballot entry that is not a valid name          → warning (entry dropped)
//! - candidate repeated on one ballot               → warning (first mention kept)
//! - ballots with no usable preference              → one warning with the count

use vm_core::ids::CandidateId;
use vm_core::variables::Params;
use vm_io::loader::LoadedElection;

use crate::PipelineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Where the issue occurred.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityRef {
    Root,
    Param(&'static str),
    BallotLine(usize),
    Candidate(CandidateId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub where_: EntityRef,
}

/// pass = no Error; issue order follows input order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub pass: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn log(&self) {
        for issue in &self.issues {
            match issue.severity {
                Severity::Error => tracing::error!(code = issue.code, "{}", issue.message),
                Severity::Warning => tracing::warn!(code = issue.code, "{}", issue.message),
            }
        }
    }

    /// First error as a `PipelineError::Config`.
    pub fn ensure_pass(&self) -> Result<(), PipelineError> {
        match self.errors().next() {
            Some(issue) => Err(PipelineError::Config(issue.message.clone())),
            None => Ok(()),
        }
    }
}

fn error(code: &'static str, where_: EntityRef, message: String) -> ValidationIssue {
    ValidationIssue { severity: Severity::Error, code, message, where_ }
}

fn warning(code: &'static str, where_: EntityRef, message: String) -> ValidationIssue {
    ValidationIssue { severity: Severity::Warning, code, message, where_ }
}

pub fn validate(loaded: &LoadedElection, params: &Params) -> ValidationReport {
    let mut issues = Vec::new();
    issues.extend(check_seats(params, loaded.candidates.len()));
    issues.extend(check_ballots(loaded));
    let pass = !issues.iter().any(|i| i.severity == Severity::Error);
    ValidationReport { pass, issues }
}

fn check_seats(params: &Params, candidate_count: usize) -> Option<ValidationIssue> {
    if candidate_count == 0 {
        return Some(error("no_candidates", EntityRef::Root, "The candidate list is empty".into()));
    }
    params.validate_domains(candidate_count).err().map(|_| {
        error(
            "seats_out_of_range",
            EntityRef::Param("seats"),
            format!(
                "The number of winners must be at least 1 and no more than the number of candidates ({candidate_count}); got {}",
                params.seats
            ),
        )
    })
}

fn check_ballots(loaded: &LoadedElection) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut empty = 0usize;
    for ballot in &loaded.ballots {
        let mut seen: Vec<&CandidateId> = Vec::new();
        let mut usable = 0usize;
        for raw in &ballot.malformed {
            issues.push(warning(
                "malformed_preference",
                EntityRef::BallotLine(ballot.line),
                format!("line {}: {raw:?} is not a valid candidate name; entry ignored", ballot.line),
            ));
        }
        for pref in &ballot.preferences {
            if !loaded.candidates.contains(pref) {
                issues.push(warning(
                    "unknown_candidate",
                    EntityRef::BallotLine(ballot.line),
                    format!("line {}: {pref} is not a listed candidate; entry ignored", ballot.line),
                ));
            } else if seen.contains(&pref) {
                issues.push(warning(
                    "duplicate_preference",
                    EntityRef::BallotLine(ballot.line),
                    format!("line {}: {pref} ranked more than once; first mention kept", ballot.line),
                ));
            } else {
                seen.push(pref);
                usable += 1;
            }
        }
        if usable == 0 {
            empty += 1;
        }
    }
    if empty > 0 {
        issues.push(warning(
            "empty_ballots",
            EntityRef::Root,
            format!("{empty} ballot(s) rank no listed candidate; counted as exhausted from the start"),
        ));
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use vm_io::loader::{parse_ballots, parse_candidates, InputDigests};

    fn election(cands: &str, csv: &str) -> LoadedElection {
        LoadedElection {
            candidates: parse_candidates(cands).unwrap(),
            ballots: parse_ballots(csv).unwrap(),
            digests: InputDigests { candidates_sha256: String::new(), ballots_sha256: String::new() },
            candidates_path: PathBuf::new(),
            ballots_path: PathBuf::new(),
        }
    }

    #[test]
    fn seat_range_is_an_error() {
        let e = election("A\nB\n", "h\nx,A\n");
        assert!(validate(&e, &Params::new(1)).pass);
        assert!(validate(&e, &Params::new(2)).pass);
        let r = validate(&e, &Params::new(3));
        assert!(!r.pass);
        assert_eq!(r.errors().next().map(|i| i.code), Some("seats_out_of_range"));
        assert!(matches!(r.ensure_pass(), Err(PipelineError::Config(_))));
        assert!(!validate(&e, &Params::new(0)).pass);
    }

    #[test]
    fn ballot_oddities_are_warnings() {
        let e = election("A\nB\n", "h\nx,A,Z,A\ny,Q\nz\n");
        let r = validate(&e, &Params::new(1));
        assert!(r.pass);
        let codes: Vec<_> = r.warnings().map(|i| i.code).collect();
        assert_eq!(
            codes,
            ["unknown_candidate", "duplicate_preference", "unknown_candidate", "empty_ballots"]
        );
        assert!(r.issues[3].message.starts_with("2 ballot(s)"));
    }

    #[test]
    fn malformed_entry_is_a_warning_not_an_error() {
        let e = election("A\nB\n", "voter,1,2\nann,A,B\u{7}x\nbob,\u{1}\n");
        assert_eq!(e.ballots[0].preferences.len(), 1);
        let r = validate(&e, &Params::new(1));
        assert!(r.pass);
        let codes: Vec<_> = r.warnings().map(|i| i.code).collect();
        assert_eq!(codes, ["malformed_preference", "malformed_preference", "empty_ballots"]);
        assert_eq!(r.issues[0].where_, EntityRef::BallotLine(2));
    }

    #[test]
    fn empty_candidate_list() {
        let e = election("", "h\n");
        let r = validate(&e, &Params::new(1));
        assert_eq!(r.errors().next().map(|i| i.code), Some("no_candidates"));
    }
}
