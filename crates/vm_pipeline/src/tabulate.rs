//! crates/vm_pipeline/src/tabulate.rs
//! TABULATE stage: hand the loaded ballots to the counting core with a seeded
//! tie RNG, and trace each round as it is played.

use vm_algo::tabulation::{RoundEvent, StvElection, StvOutcome, StvRound};
use vm_core::rng::TieRng;
use vm_io::loader::LoadedElection;

use crate::PipelineError;

#[derive(Clone, Debug, PartialEq)]
pub struct TabulateOutput {
    pub outcome: StvOutcome,
    pub tie_seed: u64,
    /// Random picks actually made (0 when no tie reached the last step).
    pub random_draws: u64,
    /// Tie-breaks of any stage.
    pub tie_breaks: u64,
}

pub fn tabulate(loaded: &LoadedElection, seats: u32, tie_seed: u64) -> Result<TabulateOutput, PipelineError> {
    let mut election = StvElection::new(&loaded.candidates, loaded.preference_lists(), seats)?;
    if election.dropped_preferences() > 0 {
        tracing::warn!(
            dropped = election.dropped_preferences(),
            "ballot entries naming unlisted candidates were ignored"
        );
    }
    tracing::info!(
        seats,
        ballots = election.state().total_ballots,
        quota = election.state().quota,
        "counting started"
    );

    let mut rng = TieRng::from_seed_u64(tie_seed);
    let mut rounds = Vec::new();
    while let Some(round) = election.step(&mut rng)? {
        trace_round(&round);
        debug_assert!(election.conservation_gap() < 1e-6, "weight not conserved");
        rounds.push(round);
    }

    let tie_breaks = rounds
        .iter()
        .flat_map(|r| r.events.iter())
        .filter(|e| matches!(e, RoundEvent::TieBreak { .. }))
        .count() as u64;

    let outcome = election.into_outcome(rounds);
    tracing::info!(winners = outcome.winners.len(), rounds = outcome.log.rounds.len(), "counting finished");

    Ok(TabulateOutput {
        outcome,
        tie_seed,
        random_draws: rng.picks(),
        tie_breaks,
    })
}

fn trace_round(round: &StvRound) {
    tracing::debug!(round = round.number, active = round.tally.len(), "round started");
    for event in &round.events {
        match event {
            RoundEvent::Winner { candidate, total, surplus_fraction } => tracing::info!(
                round = round.number,
                candidate = %candidate,
                total,
                surplus_fraction = surplus_fraction.unwrap_or(0.0),
                "elected"
            ),
            RoundEvent::Eliminated { candidate, total } => {
                tracing::info!(round = round.number, candidate = %candidate, total, "eliminated")
            }
            RoundEvent::TieBreak { contenders, resolved_by } => tracing::info!(
                round = round.number,
                contenders = contenders.len(),
                stage = resolved_by.as_str(),
                "last-place tie broken"
            ),
            RoundEvent::FinalWinners(w) => tracing::debug!(round = round.number, winners = w.len(), "final"),
        }
    }
}
