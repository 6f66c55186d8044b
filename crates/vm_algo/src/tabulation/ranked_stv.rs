// crates/vm_algo/src/tabulation/ranked_stv.rs
//
// Multi-winner round engine (Droop quota, fractional surplus transfer).
//
// Per round:
// - if active candidates == seats still open, all of them win and the run ends;
// - else the first candidate (input order) strictly above quota wins, and its
//   surplus fraction of every ballot moves on;
// - else the lowest candidate is eliminated with full transfer, ties at the
//   bottom going through the Condorcet cascade.
//
// At most one winner per round. The quota is fixed before round 1.

use vm_core::ids::CandidateId;
use vm_core::rng::TieSource;

use super::ballot::Ballot;
use super::ranked_condorcet::{condorcet_tie_break, TieBreakStage};
use super::tally::TallyState;
use super::transfer::{redistribute, TransferOutcome};
use crate::errors::TabError;

/// `total_ballots / (seats + 1)`, unrounded.
#[inline]
pub fn droop_quota(total_ballots: f64, seats: u32) -> f64 {
    total_ballots / (f64::from(seats) + 1.0)
}

/// Everything a round reports.
#[derive(Clone, Debug, PartialEq)]
pub enum RoundEvent {
    /// `surplus_fraction` is `None` when the candidate filled a seat through
    /// the last-round shortcut and nothing was transferred.
    Winner {
        candidate: CandidateId,
        total: f64,
        surplus_fraction: Option<f64>,
    },
    Eliminated {
        candidate: CandidateId,
        total: f64,
    },
    TieBreak {
        contenders: Vec<CandidateId>,
        resolved_by: TieBreakStage,
    },
    FinalWinners(Vec<CandidateId>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct StvRound {
    /// 1-based.
    pub number: u32,
    /// Active totals at the start of the round, input order.
    pub tally: Vec<(CandidateId, f64)>,
    pub events: Vec<RoundEvent>,
    pub transfer: Option<TransferOutcome>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StvLog {
    pub seats: u32,
    pub quota: f64,
    pub total_ballots: u64,
    /// Ballot entries naming no known candidate, dropped at construction.
    pub dropped_preferences: u64,
    pub exhausted_weight: f64,
    pub rounds: Vec<StvRound>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StvOutcome {
    /// Election order.
    pub winners: Vec<CandidateId>,
    pub log: StvLog,
}

/// Run-wide bookkeeping threaded through the rounds.
#[derive(Clone, Debug, PartialEq)]
pub struct ElectionState {
    pub seats: u32,
    pub quota: f64,
    pub round: u32,
    pub winners: Vec<CandidateId>,
    pub eliminated: Vec<CandidateId>,
    pub total_ballots: u64,
    /// Weight lost to ballots with no remaining preference.
    pub exhausted_weight: f64,
    /// Weight kept by resolved candidates (a winner's quota share).
    pub retained_weight: f64,
}

impl ElectionState {
    #[inline]
    pub fn remaining_seats(&self) -> usize {
        (self.seats as usize).saturating_sub(self.winners.len())
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.remaining_seats() == 0
    }

    #[inline]
    pub fn is_resolved(&self, candidate: &CandidateId) -> bool {
        self.winners.contains(candidate) || self.eliminated.contains(candidate)
    }
}

pub struct StvElection {
    ballots: Vec<Ballot>,
    originals: Vec<Ballot>,
    tally: TallyState,
    state: ElectionState,
    dropped_preferences: u64,
}

impl StvElection {
    /// Validate inputs, build ballots, and run the initial tally.
    ///
    /// Preferences naming an unknown candidate are dropped (and counted);
    /// repeated mentions of a candidate keep the first.
    pub fn new(
        candidates: &[CandidateId],
        ballots: Vec<Vec<CandidateId>>,
        seats: u32,
    ) -> Result<Self, TabError> {
        if candidates.is_empty() {
            return Err(TabError::NoCandidates);
        }
        for (i, c) in candidates.iter().enumerate() {
            if candidates[..i].contains(c) {
                return Err(TabError::DuplicateCandidate(c.clone()));
            }
        }
        if seats == 0 || seats as usize > candidates.len() {
            return Err(TabError::SeatsOutOfRange { seats, candidates: candidates.len() });
        }

        let mut dropped_preferences = 0u64;
        let ballots: Vec<Ballot> = ballots
            .into_iter()
            .map(|prefs| {
                let before = prefs.len();
                let known: Vec<CandidateId> =
                    prefs.into_iter().filter(|c| candidates.contains(c)).collect();
                dropped_preferences += (before - known.len()) as u64;
                Ballot::new(known)
            })
            .collect();

        let total_ballots = ballots.len() as u64;
        let state = ElectionState {
            seats,
            quota: droop_quota(total_ballots as f64, seats),
            round: 0,
            winners: Vec::new(),
            eliminated: Vec::new(),
            total_ballots,
            exhausted_weight: 0.0,
            retained_weight: 0.0,
        };

        let mut election = Self {
            originals: ballots.clone(),
            ballots,
            tally: TallyState::new(candidates),
            state,
            dropped_preferences,
        };
        election.initial_tally();
        Ok(election)
    }

    fn initial_tally(&mut self) {
        for ballot in self.ballots.iter_mut() {
            ballot.reset_cursor();
            match ballot.current_preference() {
                Some(first) => {
                    self.tally.credit(first, ballot.weight());
                }
                None => self.state.exhausted_weight += ballot.weight(),
            }
        }
    }

    #[inline]
    pub fn state(&self) -> &ElectionState {
        &self.state
    }

    #[inline]
    pub fn tally(&self) -> &TallyState {
        &self.tally
    }

    #[inline]
    pub fn ballots(&self) -> &[Ballot] {
        &self.ballots
    }

    #[inline]
    pub fn dropped_preferences(&self) -> u64 {
        self.dropped_preferences
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.state.is_complete()
    }

    /// `|active + exhausted + retained - ballots|`; stays near zero for the
    /// whole run.
    pub fn conservation_gap(&self) -> f64 {
        let accounted = self.tally.sum() + self.state.exhausted_weight + self.state.retained_weight;
        (accounted - self.state.total_ballots as f64).abs()
    }

    /// Play one round. `Ok(None)` once every seat is filled.
    pub fn step<S: TieSource + ?Sized>(&mut self, rng: &mut S) -> Result<Option<StvRound>, TabError> {
        if self.is_done() {
            return Ok(None);
        }
        self.state.round += 1;
        let mut round = StvRound {
            number: self.state.round,
            tally: self.tally.snapshot(),
            events: Vec::new(),
            transfer: None,
        };

        if self.tally.len() == self.state.remaining_seats() {
            let rest: Vec<(CandidateId, f64)> = self.tally.snapshot();
            for (candidate, total) in rest {
                self.tally.remove(&candidate);
                self.state.retained_weight += total;
                self.state.winners.push(candidate.clone());
                round.events.push(RoundEvent::Winner { candidate, total, surplus_fraction: None });
            }
            round.events.push(RoundEvent::FinalWinners(self.state.winners.clone()));
            return Ok(Some(round));
        }

        let mut over_quota: Option<(CandidateId, f64)> = None;
        let mut lowest: Option<f64> = None;
        let mut tied: Vec<CandidateId> = Vec::new();
        for (candidate, total) in self.tally.iter() {
            if over_quota.is_none() && total > self.state.quota {
                over_quota = Some((candidate.clone(), total));
            }
            match lowest {
                Some(min) if total > min => {}
                Some(min) if total == min => tied.push(candidate.clone()),
                _ => {
                    lowest = Some(total);
                    tied.clear();
                    tied.push(candidate.clone());
                }
            }
        }

        if let Some((candidate, total)) = over_quota {
            let fraction = (total - self.state.quota) / self.state.total_ballots as f64;
            let moved = self.resolve(&candidate, fraction);
            self.state.winners.push(candidate.clone());
            round.events.push(RoundEvent::Winner {
                candidate,
                total,
                surplus_fraction: Some(fraction),
            });
            round.transfer = Some(moved);
            if self.is_done() {
                round.events.push(RoundEvent::FinalWinners(self.state.winners.clone()));
            }
            return Ok(Some(round));
        }

        let loser = match tied.len() {
            0 => return Err(TabError::NoCandidates),
            1 => tied.swap_remove(0),
            _ => {
                let outcome = condorcet_tie_break(&tied, &self.originals, rng)?;
                round.events.push(RoundEvent::TieBreak {
                    contenders: outcome.contenders,
                    resolved_by: outcome.stage,
                });
                outcome.eliminated
            }
        };
        let total = self.tally.total(&loser).unwrap_or(0.0);
        let moved = self.resolve(&loser, 1.0);
        self.state.eliminated.push(loser.clone());
        round.events.push(RoundEvent::Eliminated { candidate: loser, total });
        round.transfer = Some(moved);
        Ok(Some(round))
    }

    /// Redistribute, drop from the tally, and book the leftover weight.
    fn resolve(&mut self, candidate: &CandidateId, fraction: f64) -> TransferOutcome {
        let moved = redistribute(&mut self.ballots, &mut self.tally, candidate, fraction);
        let total = self.tally.remove(candidate).unwrap_or(0.0);
        self.state.exhausted_weight += moved.exhausted;
        self.state.retained_weight += total - moved.transferred - moved.exhausted;
        moved
    }

    /// Play rounds until every seat is filled.
    pub fn run<S: TieSource + ?Sized>(mut self, rng: &mut S) -> Result<StvOutcome, TabError> {
        let mut rounds = Vec::new();
        while let Some(round) = self.step(rng)? {
            rounds.push(round);
        }
        Ok(self.into_outcome(rounds))
    }

    /// Close the election with the rounds played through [`step`](Self::step).
    pub fn into_outcome(self, rounds: Vec<StvRound>) -> StvOutcome {
        StvOutcome {
            winners: self.state.winners,
            log: StvLog {
                seats: self.state.seats,
                quota: self.state.quota,
                total_ballots: self.state.total_ballots,
                dropped_preferences: self.dropped_preferences,
                exhausted_weight: self.state.exhausted_weight,
                rounds,
            },
        }
    }
}

/// Count a whole election in one call.
pub fn tabulate_stv<S: TieSource + ?Sized>(
    candidates: &[CandidateId],
    ballots: Vec<Vec<CandidateId>>,
    seats: u32,
    rng: &mut S,
) -> Result<StvOutcome, TabError> {
    StvElection::new(candidates, ballots, seats)?.run(rng)
}
