// crates/vm_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Algorithm layer for multi-winner ranked-choice counting.
//!
//! Pure and single-threaded: callers hand over parsed candidates and ballots,
//! plus a [`vm_core::TieSource`] for the last tie-break step, and get back the
//! winners together with a round-by-round log.

pub use vm_core::ids::CandidateId;

pub mod errors {
    use core::fmt;

    use vm_core::ids::CandidateId;

    /// Guards raised before counting starts (or by a misbehaving tie source).
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum TabError {
        NoCandidates,
        DuplicateCandidate(CandidateId),
        SeatsOutOfRange { seats: u32, candidates: usize },
        EmptyTieSet,
        TieSourceExhausted,
    }

    impl fmt::Display for TabError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                TabError::NoCandidates => write!(f, "no candidates"),
                TabError::DuplicateCandidate(c) => write!(f, "duplicate candidate: {c}"),
                TabError::SeatsOutOfRange { seats, candidates } => write!(
                    f,
                    "seats {seats} out of range: must be at least 1 and no more than {candidates}"
                ),
                TabError::EmptyTieSet => write!(f, "tie-break called with fewer than two candidates"),
                TabError::TieSourceExhausted => write!(f, "tie source returned no pick"),
            }
        }
    }

    impl std::error::Error for TabError {}
}

pub use errors::TabError;

// ----------------------------- Tabulation (public surface) ---------------------------

pub mod tabulation {
    pub mod ballot;
    pub mod tally;
    pub mod transfer;
    pub mod ranked_condorcet;
    pub mod ranked_stv;

    pub use ballot::{purge_preference, Ballot};
    pub use ranked_condorcet::{condorcet_tie_break, PairwiseMatrix, TieBreakOutcome, TieBreakStage};
    pub use ranked_stv::{
        droop_quota, tabulate_stv, ElectionState, RoundEvent, StvElection, StvLog, StvOutcome,
        StvRound,
    };
    pub use tally::TallyState;
    pub use transfer::{redistribute, TransferOutcome};
}

// Convenience re-exports (pipeline imports these from crate root)
pub use tabulation::{
    tabulate_stv, RoundEvent, StvElection, StvLog, StvOutcome, StvRound, TieBreakStage,
    TransferOutcome,
};
