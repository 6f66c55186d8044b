//! Condorcet cascade for ties at the bottom of a round.
//!
//! Picks exactly one of the tied candidates for elimination, using only the
//! untouched original ballots:
//! 1. pairwise victories inside the tied set (fewest wins goes),
//! 2. summed victory margins inside the tied set,
//! 3. rank points over all ballots,
//! 4. a uniform pick from the tie source.
//!
//! Steps 1–3 are deterministic; only step 4 consumes randomness.

use vm_core::ids::CandidateId;
use vm_core::rng::TieSource;

use super::ballot::Ballot;
use crate::errors::TabError;

/// Which step of the cascade settled the tie.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TieBreakStage {
    PairwiseWins,
    Magnitude,
    Points,
    Random,
}

impl TieBreakStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreakStage::PairwiseWins => "pairwise_wins",
            TieBreakStage::Magnitude => "magnitude",
            TieBreakStage::Points => "points",
            TieBreakStage::Random => "random",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TieBreakOutcome {
    pub eliminated: CandidateId,
    pub stage: TieBreakStage,
    /// The tied set as passed in.
    pub contenders: Vec<CandidateId>,
}

/// Pairwise counts over the tied subset: `count(i, j)` = number of ballots on
/// which contender `i` beats contender `j`. Stored as a flat `n×n` array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairwiseMatrix {
    n: usize,
    counts: Vec<u64>,
}

impl PairwiseMatrix {
    pub fn from_ballots(tied: &[CandidateId], originals: &[Ballot]) -> Self {
        let n = tied.len();
        let mut counts = vec![0u64; n * n];
        for ballot in originals {
            for (i, r) in tied.iter().enumerate() {
                for (j, o) in tied.iter().enumerate() {
                    if i != j && ballot.pairwise_beats(r, o) {
                        counts[i * n + j] += 1;
                    }
                }
            }
        }
        Self { n, counts }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn count(&self, i: usize, j: usize) -> u64 {
        self.counts[i * self.n + j]
    }

    #[inline]
    pub fn beats(&self, i: usize, j: usize) -> bool {
        self.count(i, j) > self.count(j, i)
    }

    /// Signed margin of `i` over `j`.
    #[inline]
    pub fn magnitude(&self, i: usize, j: usize) -> i64 {
        self.count(i, j) as i64 - self.count(j, i) as i64
    }

    /// Number of opponents `i` beats.
    pub fn win_total(&self, i: usize) -> u64 {
        (0..self.n).filter(|&j| j != i && self.beats(i, j)).count() as u64
    }

    pub fn magnitude_total(&self, i: usize) -> i64 {
        (0..self.n).filter(|&j| j != i).map(|j| self.magnitude(i, j)).sum()
    }
}

/// Keep the indices whose key equals the minimum key.
fn weakest<K: Ord + Copy>(pool: &[usize], key: impl Fn(usize) -> K) -> Vec<usize> {
    let Some(min) = pool.iter().map(|&i| key(i)).min() else {
        return Vec::new();
    };
    pool.iter().copied().filter(|&i| key(i) == min).collect()
}

/// Choose one of `tied` (two or more candidates) to eliminate.
pub fn condorcet_tie_break<S: TieSource + ?Sized>(
    tied: &[CandidateId],
    originals: &[Ballot],
    rng: &mut S,
) -> Result<TieBreakOutcome, TabError> {
    if tied.len() < 2 {
        return Err(TabError::EmptyTieSet);
    }

    let matrix = PairwiseMatrix::from_ballots(tied, originals);
    let all: Vec<usize> = (0..tied.len()).collect();
    let settle = |idx: usize, stage: TieBreakStage| TieBreakOutcome {
        eliminated: tied[idx].clone(),
        stage,
        contenders: tied.to_vec(),
    };

    let pool = weakest(&all, |i| matrix.win_total(i));
    if let [only] = pool[..] {
        return Ok(settle(only, TieBreakStage::PairwiseWins));
    }

    let pool = weakest(&pool, |i| matrix.magnitude_total(i));
    if let [only] = pool[..] {
        return Ok(settle(only, TieBreakStage::Magnitude));
    }

    let points = |i: usize| -> u64 { originals.iter().map(|b| b.rank_score(&tied[i])).sum() };
    let pool = weakest(&pool, points);
    if let [only] = pool[..] {
        return Ok(settle(only, TieBreakStage::Points));
    }

    let pick = rng
        .pick_index(pool.len())
        .ok_or(TabError::TieSourceExhausted)?;
    let idx = pool[pick.min(pool.len() - 1)];
    Ok(settle(idx, TieBreakStage::Random))
}
