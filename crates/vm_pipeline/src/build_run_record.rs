//! crates/vm_pipeline/src/build_run_record.rs
//! BUILD_RUN_RECORD: what ran, on which inputs, with which seed.
//!
//! The tie seed is always echoed so that a run whose last-place tie reached
//! the random step can be replayed exactly.

use serde::{Deserialize, Serialize};

use vm_core::ids::{ResultId, RunId};
use vm_core::variables::Params;
use vm_io::{hasher, loader::LoadedElection};

use crate::build_result::ResultDoc;
use crate::tabulate::TabulateOutput;
use crate::{EngineMeta, PipelineError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecordDoc {
    pub id: RunId,
    #[serde(flatten)]
    pub body: RunRecordBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecordBody {
    pub timestamp_utc: String,
    pub engine: EngineMeta,
    pub inputs: RunInputs,
    pub params: Params,
    pub tie: TieEcho,
    pub outputs: RunOutputs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInputs {
    pub candidates_path: String,
    pub candidates_sha256: String,
    pub ballots_path: String,
    pub ballots_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieEcho {
    pub seed: u64,
    pub tie_breaks: u64,
    pub random_draws: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutputs {
    pub result_id: ResultId,
    pub result_sha256: String,
}

pub fn build_run_record(
    loaded: &LoadedElection,
    params: &Params,
    tab: &TabulateOutput,
    result: &ResultDoc,
    engine: EngineMeta,
    timestamp_utc: &str,
) -> Result<RunRecordDoc, PipelineError> {
    let build_err = |e: hasher::HashError| PipelineError::Build(e.to_string());

    let outputs = RunOutputs {
        result_id: result.id.clone(),
        result_sha256: hasher::sha256_canonical(result).map_err(build_err)?,
    };
    let body = RunRecordBody {
        timestamp_utc: timestamp_utc.to_string(),
        engine,
        inputs: RunInputs {
            candidates_path: loaded.candidates_path.display().to_string(),
            candidates_sha256: loaded.digests.candidates_sha256.clone(),
            ballots_path: loaded.ballots_path.display().to_string(),
            ballots_sha256: loaded.digests.ballots_sha256.clone(),
        },
        params: Params { seats: params.seats, tie_seed: Some(tab.tie_seed) },
        tie: TieEcho {
            seed: tab.tie_seed,
            tie_breaks: tab.tie_breaks,
            random_draws: tab.random_draws,
        },
        outputs,
    };
    let id = hasher::run_id_from_canonical(timestamp_utc, &body).map_err(build_err)?;
    Ok(RunRecordDoc { id, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_result::build_result, engine_identifiers, tabulate::tabulate};
    use std::path::PathBuf;
    use vm_io::loader::{parse_ballots, parse_candidates, InputDigests};

    fn election() -> LoadedElection {
        LoadedElection {
            candidates: parse_candidates("A\nB\nC\n").unwrap(),
            ballots: parse_ballots("h\n1,A,B\n2,B,A\n").unwrap(),
            digests: InputDigests {
                candidates_sha256: "c".repeat(64),
                ballots_sha256: "b".repeat(64),
            },
            candidates_path: PathBuf::from("c.txt"),
            ballots_path: PathBuf::from("v.csv"),
        }
    }

    #[test]
    fn echoes_seed_and_draws() {
        let e = election();
        let params = Params::new(1).with_tie_seed(11);
        let tab = tabulate(&e, 1, 11).unwrap();
        let res = build_result(&e, &tab.outcome).unwrap();
        let rec = build_run_record(&e, &params, &tab, &res, engine_identifiers(), "2025-01-02T03:04:05Z").unwrap();

        assert!(rec.id.as_str().starts_with("RUN:2025-01-02T03:04:05Z-"));
        assert_eq!(rec.body.tie, TieEcho { seed: 11, tie_breaks: 1, random_draws: 1 });
        assert_eq!(rec.body.outputs.result_id, res.id);
        assert_eq!(rec.body.inputs.ballots_sha256, "b".repeat(64));
        assert_eq!(rec.body.params.tie_seed, Some(11));
    }

    #[test]
    fn bad_timestamp_is_build_error() {
        let e = election();
        let tab = tabulate(&e, 1, 0).unwrap();
        let res = build_result(&e, &tab.outcome).unwrap();
        let err = build_run_record(&e, &Params::new(1), &tab, &res, engine_identifiers(), "now").unwrap_err();
        assert!(matches!(err, PipelineError::Build(_)));
    }
}
