// crates/vm_algo/src/tabulation/transfer.rs
//
// Moves weight away from a resolved candidate.
//
// Order matters: transfers are computed on the pre-removal preference lists,
// and only afterwards is the candidate purged from every ballot.

use vm_core::ids::CandidateId;

use super::ballot::Ballot;
use super::tally::TallyState;

/// Summary of one redistribution.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransferOutcome {
    /// Weight credited to next preferences (after scaling).
    pub transferred: f64,
    /// Weight of ballots that had no next preference.
    pub exhausted: f64,
    pub ballots_moved: u64,
    pub ballots_exhausted: u64,
}

/// For each ballot currently crediting `candidate`: scale by `fraction`,
/// advance, and credit the new current preference; ballots with nowhere to go
/// exhaust. Then purge `candidate` from all ballots.
pub fn redistribute(
    ballots: &mut [Ballot],
    tally: &mut TallyState,
    candidate: &CandidateId,
    fraction: f64,
) -> TransferOutcome {
    let mut out = TransferOutcome::default();

    for ballot in ballots.iter_mut() {
        if ballot.current_preference() != Some(candidate) {
            continue;
        }
        if ballot.has_next_preference() {
            ballot.scale_weight(fraction);
            ballot.advance();
            if let Some(next) = ballot.current_preference() {
                let credited = tally.credit(next, ballot.weight());
                debug_assert!(credited, "next preference {next} is not active");
                out.transferred += ballot.weight();
                out.ballots_moved += 1;
            }
        } else {
            out.exhausted += ballot.weight();
            out.ballots_exhausted += 1;
        }
    }

    for ballot in ballots.iter_mut() {
        ballot.remove_preference(candidate);
    }

    out
}
