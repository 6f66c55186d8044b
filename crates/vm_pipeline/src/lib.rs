//! vm_pipeline — one counting run, end to end (load → validate → tabulate → build result → build run record).
//! File access, canonical JSON, and hashing go through `vm_io`; counting goes through `vm_algo`.

use std::path::{Path, PathBuf};

use thiserror::Error;

use vm_core::variables::Params;
use vm_io::{canonical_json, loader::LoadedElection, IoError};

pub mod build_result;
pub mod build_run_record;
pub mod load;
pub mod tabulate;
pub mod validate;

pub use build_result::{EventDoc, ResultBody, ResultDoc, RoundDoc, TallyEntry, TransferDoc};
pub use build_run_record::{RunInputs, RunOutputs, RunRecordBody, RunRecordDoc, TieEcho};
pub use load::{InputSource, LoadedRun};
pub use validate::{Severity, ValidationIssue, ValidationReport};

/// Engine identifiers echoed in every run record.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EngineMeta {
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub build: String,
}

pub fn engine_identifiers() -> EngineMeta {
    EngineMeta {
        vendor: "vm".to_string(),
        name: "vm_stv".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: if cfg!(debug_assertions) { "dev" } else { "release" }.to_string(),
    }
}

/// Single error surface for the pipeline orchestration.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad run parameters (seat count); counting never starts.
    #[error("configuration error: {0}")]
    Config(String),
    /// Missing, unreadable, or malformed inputs.
    #[error("ingestion error: {0}")]
    Ingest(String),
    #[error("tabulation error: {0}")]
    Tabulate(String),
    /// Artifact building / writing.
    #[error("build error: {0}")]
    Build(String),
}

impl From<IoError> for PipelineError {
    fn from(e: IoError) -> Self {
        match e {
            IoError::Read { .. } | IoError::Invalid(_) | IoError::Manifest(_) | IoError::Json { .. } => {
                PipelineError::Ingest(e.to_string())
            }
            IoError::Path(_) | IoError::Hash(_) => PipelineError::Build(e.to_string()),
        }
    }
}

impl From<vm_algo::TabError> for PipelineError {
    fn from(e: vm_algo::TabError) -> Self {
        use vm_algo::TabError::*;
        match e {
            SeatsOutOfRange { .. } | NoCandidates => PipelineError::Config(e.to_string()),
            DuplicateCandidate(_) => PipelineError::Ingest(e.to_string()),
            EmptyTieSet | TieSourceExhausted => PipelineError::Tabulate(e.to_string()),
        }
    }
}

/// Top-level outputs of a run.
#[derive(Debug, Clone)]
pub struct PipelineOutputs {
    pub result: ResultDoc,
    pub run_record: RunRecordDoc,
    pub validation: ValidationReport,
}

/// Count an already-loaded election.
///
/// `params.tie_seed` should be resolved by the caller; when absent, seed 0 is
/// used and recorded. `timestamp_utc` is `YYYY-MM-DDTHH:MM:SSZ`.
pub fn run_election(
    loaded: &LoadedElection,
    params: &Params,
    timestamp_utc: &str,
) -> Result<PipelineOutputs, PipelineError> {
    let validation = validate::validate(loaded, params);
    validation.log();
    validation.ensure_pass()?;

    let seed = params.tie_seed.unwrap_or(0);
    let tab = tabulate::tabulate(loaded, params.seats, seed)?;
    let result = build_result::build_result(loaded, &tab.outcome)?;
    let run_record = build_run_record::build_run_record(
        loaded,
        params,
        &tab,
        &result,
        engine_identifiers(),
        timestamp_utc,
    )?;

    Ok(PipelineOutputs { result, run_record, validation })
}

/// Load from `source`, merge manifest defaults under `overrides`, and count.
///
/// `overrides` wins field by field; seats must come from one of the two.
pub fn run_from_source(
    source: &InputSource,
    overrides: RunOverrides,
    timestamp_utc: &str,
) -> Result<PipelineOutputs, PipelineError> {
    let loaded = load::load(source)?;
    let params = loaded.params(overrides)?;
    run_election(&loaded.election, &params, timestamp_utc)
}

/// Values supplied on the command line, overriding manifest values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOverrides {
    pub seats: Option<u32>,
    pub tie_seed: Option<u64>,
}

/// Where `write_artifacts` put things.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub result: PathBuf,
    pub run_record: PathBuf,
}

/// Write `result.json` and `run_record.json` (canonical JSON) into `out_dir`.
pub fn write_artifacts(out_dir: &Path, outputs: &PipelineOutputs) -> Result<ArtifactPaths, PipelineError> {
    let paths = ArtifactPaths {
        result: out_dir.join("result.json"),
        run_record: out_dir.join("run_record.json"),
    };
    let result = serde_json::to_value(&outputs.result).map_err(|e| PipelineError::Build(e.to_string()))?;
    let run = serde_json::to_value(&outputs.run_record).map_err(|e| PipelineError::Build(e.to_string()))?;
    canonical_json::write_canonical_file(&paths.result, &result)?;
    canonical_json::write_canonical_file(&paths.run_record, &run)?;
    tracing::info!(dir = %out_dir.display(), "artifacts written");
    Ok(paths)
}
