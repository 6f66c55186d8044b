// crates/vm_algo/src/tabulation/tally.rs
//
// Active candidate → accumulated weighted total.
//
// Entries live in candidate-input order and never get re-inserted once
// removed, so iteration order is the deterministic scan order of the rounds.

use vm_core::ids::CandidateId;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TallyState {
    entries: Vec<(CandidateId, f64)>,
}

impl TallyState {
    /// One zeroed entry per candidate, in the given order.
    pub fn new(candidates: &[CandidateId]) -> Self {
        Self {
            entries: candidates.iter().map(|c| (c.clone(), 0.0)).collect(),
        }
    }

    /// Add `weight` to an active candidate. Returns `false` if the candidate
    /// is not active.
    pub fn credit(&mut self, candidate: &CandidateId, weight: f64) -> bool {
        match self.entries.iter_mut().find(|(c, _)| c == candidate) {
            Some((_, total)) => {
                *total += weight;
                true
            }
            None => false,
        }
    }

    pub fn total(&self, candidate: &CandidateId) -> Option<f64> {
        self.entries
            .iter()
            .find(|(c, _)| c == candidate)
            .map(|(_, t)| *t)
    }

    /// Remove an active candidate, returning its final total.
    pub fn remove(&mut self, candidate: &CandidateId) -> Option<f64> {
        let at = self.entries.iter().position(|(c, _)| c == candidate)?;
        Some(self.entries.remove(at).1)
    }

    #[inline]
    pub fn contains(&self, candidate: &CandidateId) -> bool {
        self.entries.iter().any(|(c, _)| c == candidate)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CandidateId, f64)> + '_ {
        self.entries.iter().map(|(c, t)| (c, *t))
    }

    pub fn candidates(&self) -> impl Iterator<Item = &CandidateId> + '_ {
        self.entries.iter().map(|(c, _)| c)
    }

    /// Owned copy for round reporting.
    pub fn snapshot(&self) -> Vec<(CandidateId, f64)> {
        self.entries.clone()
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, t)| t).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(n: &str) -> CandidateId {
        CandidateId::new(n).unwrap()
    }

    #[test]
    fn credit_and_remove() {
        let mut t = TallyState::new(&[cid("A"), cid("B"), cid("C")]);
        assert!(t.credit(&cid("B"), 1.0));
        assert!(t.credit(&cid("B"), 0.25));
        assert!(!t.credit(&cid("Z"), 1.0));
        assert_eq!(t.total(&cid("B")), Some(1.25));
        assert_eq!(t.remove(&cid("B")), Some(1.25));
        assert!(!t.contains(&cid("B")));
        assert!(!t.credit(&cid("B"), 1.0));
        assert_eq!(t.remove(&cid("B")), None);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn iteration_keeps_input_order() {
        let mut t = TallyState::new(&[cid("C"), cid("A"), cid("B")]);
        t.credit(&cid("A"), 2.0);
        t.remove(&cid("A"));
        let order: Vec<_> = t.candidates().map(|c| c.as_str().to_owned()).collect();
        assert_eq!(order, ["C", "B"]);
        assert_eq!(t.sum(), 0.0);
    }
}
