// crates/vm_algo/src/tabulation/ballot.rs
//
// One voter's ranked preferences, the cursor at the preference currently
// credited, and the ballot's weight.
//
// Invariants:
// - weight stays in (0, 1] and never increases.
// - cursor indexes a valid position of `prefs`, or `prefs` is empty (exhausted).
// - a candidate appears at most once in `prefs`.

use vm_core::ids::CandidateId;

#[derive(Clone, Debug, PartialEq)]
pub struct Ballot {
    prefs: Vec<CandidateId>,
    cursor: usize,
    weight: f64,
}

impl Ballot {
    /// Full-weight ballot. Repeated mentions of one candidate keep only the first.
    pub fn new(prefs: Vec<CandidateId>) -> Self {
        let mut seen: Vec<&CandidateId> = Vec::with_capacity(prefs.len());
        let mut keep = Vec::with_capacity(prefs.len());
        for (i, c) in prefs.iter().enumerate() {
            if !seen.contains(&c) {
                seen.push(c);
                keep.push(i);
            }
        }
        let prefs = if keep.len() == prefs.len() {
            prefs
        } else {
            keep.into_iter().map(|i| prefs[i].clone()).collect()
        };
        Self { prefs, cursor: 0, weight: 1.0 }
    }

    #[inline]
    pub fn preferences(&self) -> &[CandidateId] {
        &self.prefs
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Candidate currently credited with this ballot; `None` once exhausted.
    #[inline]
    pub fn current_preference(&self) -> Option<&CandidateId> {
        self.prefs.get(self.cursor)
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.prefs.len()
    }

    #[inline]
    pub fn has_next_preference(&self) -> bool {
        self.cursor + 1 < self.prefs.len()
    }

    /// Move to the next preference. No-op returning `false` at the last one.
    pub fn advance(&mut self) -> bool {
        if self.has_next_preference() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Drop every occurrence of `candidate`, keeping the cursor on the same
    /// logical entry. If nothing is left at or after the cursor the ballot is
    /// exhausted and its sequence is cleared.
    pub fn remove_preference(&mut self, candidate: &CandidateId) {
        let (prefs, cursor) = purge_preference(&self.prefs, self.cursor, candidate);
        if cursor >= prefs.len() {
            self.prefs.clear();
            self.cursor = 0;
        } else {
            self.prefs = prefs;
            self.cursor = cursor;
        }
    }

    /// Multiply the weight by `factor` in (0, 1].
    pub fn scale_weight(&mut self, factor: f64) {
        debug_assert!(factor > 0.0 && factor <= 1.0, "scale factor {factor} outside (0, 1]");
        self.weight *= factor;
    }

    #[inline]
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Points for `candidate`: `len - index` when ranked, else 0.
    pub fn rank_score(&self, candidate: &CandidateId) -> u64 {
        self.position(candidate)
            .map(|i| (self.prefs.len() - i) as u64)
            .unwrap_or(0)
    }

    /// `r` ranked strictly above `o`, or `r` ranked and `o` absent.
    pub fn pairwise_beats(&self, r: &CandidateId, o: &CandidateId) -> bool {
        if r == o {
            return false;
        }
        match (self.position(r), self.position(o)) {
            (Some(ri), Some(oi)) => ri < oi,
            (Some(_), None) => true,
            _ => false,
        }
    }

    #[inline]
    fn position(&self, candidate: &CandidateId) -> Option<usize> {
        self.prefs.iter().position(|c| c == candidate)
    }
}

/// Filter `candidate` out of `prefs` and shift `cursor` back once for every
/// removed entry that sat before it. The returned cursor may equal the new
/// length when nothing remains at or after it.
pub fn purge_preference(
    prefs: &[CandidateId],
    cursor: usize,
    candidate: &CandidateId,
) -> (Vec<CandidateId>, usize) {
    let removed_before = prefs
        .iter()
        .take(cursor)
        .filter(|c| *c == candidate)
        .count();
    let kept = prefs.iter().filter(|c| *c != candidate).cloned().collect();
    (kept, cursor - removed_before)
}
