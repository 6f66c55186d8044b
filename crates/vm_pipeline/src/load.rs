//! crates/vm_pipeline/src/load.rs
//! LOAD stage: resolve where the inputs come from (two paths, or a manifest
//! naming them) and read them through `vm_io`.

use std::path::PathBuf;

use vm_core::variables::Params;
use vm_io::{loader, manifest};

use crate::{PipelineError, RunOverrides};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Files { candidates: PathBuf, ballots: PathBuf },
    Manifest(PathBuf),
}

/// Loaded inputs plus whatever parameters the manifest carried.
#[derive(Debug, Clone)]
pub struct LoadedRun {
    pub election: loader::LoadedElection,
    pub manifest_seats: Option<u32>,
    pub manifest_tie_seed: Option<u64>,
}

impl LoadedRun {
    /// Merge manifest values under command-line overrides.
    pub fn params(&self, overrides: RunOverrides) -> Result<Params, PipelineError> {
        let seats = overrides
            .seats
            .or(self.manifest_seats)
            .ok_or_else(|| PipelineError::Config("seat count not given".into()))?;
        let mut params = Params::new(seats);
        params.tie_seed = overrides.tie_seed.or(self.manifest_tie_seed);
        Ok(params)
    }
}

pub fn load(source: &InputSource) -> Result<LoadedRun, PipelineError> {
    match source {
        InputSource::Files { candidates, ballots } => Ok(LoadedRun {
            election: loader::load_election(candidates, ballots)?,
            manifest_seats: None,
            manifest_tie_seed: None,
        }),
        InputSource::Manifest(path) => {
            let resolved = manifest::load_manifest(path)?;
            let election = loader::load_election(&resolved.candidates_path, &resolved.ballots_path)?;
            Ok(LoadedRun {
                election,
                manifest_seats: resolved.seats,
                manifest_tie_seed: resolved.tie_seed,
            })
        }
    }
}
