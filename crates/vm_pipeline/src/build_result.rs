//! crates/vm_pipeline/src/build_result.rs
//! BUILD_RESULT: typed `result.json` from the counting log.
//!
//! The id is `RES:` + sha256 of the canonical body, so identical inputs with
//! identical tie outcomes produce the same id.

use serde::{Deserialize, Serialize};

use vm_algo::tabulation::{RoundEvent, StvOutcome, StvRound};
use vm_core::ids::{CandidateId, ResultId};
use vm_io::{hasher, loader::LoadedElection};

use crate::PipelineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDoc {
    pub id: ResultId,
    #[serde(flatten)]
    pub body: ResultBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBody {
    pub seats: u32,
    pub quota: f64,
    pub total_ballots: u64,
    pub candidates: Vec<CandidateId>,
    pub rounds: Vec<RoundDoc>,
    pub winners: Vec<CandidateId>,
    pub exhausted_weight: f64,
    pub dropped_preferences: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundDoc {
    pub round: u32,
    pub tally: Vec<TallyEntry>,
    pub events: Vec<EventDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer: Option<TransferDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub candidate: CandidateId,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventDoc {
    Winner {
        candidate: CandidateId,
        total: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        surplus_fraction: Option<f64>,
    },
    Eliminated {
        candidate: CandidateId,
        total: f64,
    },
    TieBreak {
        contenders: Vec<CandidateId>,
        resolved_by: String,
    },
    FinalWinners {
        winners: Vec<CandidateId>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferDoc {
    pub transferred: f64,
    pub exhausted: f64,
    pub ballots_moved: u64,
    pub ballots_exhausted: u64,
}

fn event_doc(ev: &RoundEvent) -> EventDoc {
    match ev {
        RoundEvent::Winner { candidate, total, surplus_fraction } => EventDoc::Winner {
            candidate: candidate.clone(),
            total: *total,
            surplus_fraction: *surplus_fraction,
        },
        RoundEvent::Eliminated { candidate, total } => EventDoc::Eliminated {
            candidate: candidate.clone(),
            total: *total,
        },
        RoundEvent::TieBreak { contenders, resolved_by } => EventDoc::TieBreak {
            contenders: contenders.clone(),
            resolved_by: resolved_by.as_str().to_string(),
        },
        RoundEvent::FinalWinners(w) => EventDoc::FinalWinners { winners: w.clone() },
    }
}

fn round_doc(r: &StvRound) -> RoundDoc {
    RoundDoc {
        round: r.number,
        tally: r
            .tally
            .iter()
            .map(|(candidate, total)| TallyEntry { candidate: candidate.clone(), total: *total })
            .collect(),
        events: r.events.iter().map(event_doc).collect(),
        transfer: r.transfer.map(|t| TransferDoc {
            transferred: t.transferred,
            exhausted: t.exhausted,
            ballots_moved: t.ballots_moved,
            ballots_exhausted: t.ballots_exhausted,
        }),
    }
}

pub fn build_result(loaded: &LoadedElection, outcome: &StvOutcome) -> Result<ResultDoc, PipelineError> {
    let log = &outcome.log;
    let body = ResultBody {
        seats: log.seats,
        quota: log.quota,
        total_ballots: log.total_ballots,
        candidates: loaded.candidates.clone(),
        rounds: log.rounds.iter().map(round_doc).collect(),
        winners: outcome.winners.clone(),
        exhausted_weight: log.exhausted_weight,
        dropped_preferences: log.dropped_preferences,
    };
    let id = hasher::res_id_from_canonical(&body).map_err(|e| PipelineError::Build(e.to_string()))?;
    Ok(ResultDoc { id, body })
}
