// crates/vm_core/src/rng.rs
//
// Seedable RNG for the last-resort tie-break step.
// Focus: unbiased range generation, stable seeding, word-index accounting.
//
// • The tie seed is the only source of randomness inside a run; callers that
//   want a fresh seed draw it outside and record it so the run can be replayed.
// • Integer-only draws: unbiased ranges via rejection sampling.
// • Cross-platform determinism: explicit seeding and word-index accounting.

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

/// Source of uniform picks for the final tie-break step.
///
/// The tabulation core only ever asks for one index in `[0, n)`. Tests swap in
/// scripted sources; production runs use [`TieRng`].
pub trait TieSource {
    /// Uniform index in `[0, n)`; `None` when `n == 0`.
    fn pick_index(&mut self, n: usize) -> Option<usize>;
}

impl<T: TieSource + ?Sized> TieSource for &mut T {
    #[inline]
    fn pick_index(&mut self, n: usize) -> Option<usize> {
        (**self).pick_index(n)
    }
}

/// Deterministic RNG for ties.
///
/// Internally uses ChaCha20 with an explicit 32-byte seed derived from the
/// 64-bit tie seed (little-endian bytes in the first 8 positions; the rest 0).
#[derive(Debug, Clone)]
pub struct TieRng {
    rng: ChaCha20Rng,
    seed: u64,
    words_consumed: u128,
    picks: u64,
}

impl TieRng {
    /// Construct from a 64-bit seed: `seed.to_le_bytes()` into the first
    /// 8 bytes of the ChaCha20 seed; the remaining 24 bytes are zero.
    #[inline]
    pub fn from_seed_u64(seed: u64) -> Self {
        let mut seed32 = [0u8; 32];
        seed32[..8].copy_from_slice(&seed.to_le_bytes());
        Self {
            rng: ChaCha20Rng::from_seed(seed32),
            seed,
            words_consumed: 0,
            picks: 0,
        }
    }

    /// The seed this stream was built from.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Total number of 64-bit words consumed so far (saturating).
    /// Rejected draws count too.
    #[inline]
    pub fn words_consumed(&self) -> u128 {
        self.words_consumed
    }

    /// Number of completed picks.
    #[inline]
    pub fn picks(&self) -> u64 {
        self.picks
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.words_consumed = self.words_consumed.saturating_add(1);
        self.rng.next_u64()
    }

    /// Unbiased integer in `[0, n)`. Returns `None` if `n == 0`.
    ///
    /// Let `threshold = 2^64 mod n` (computed via `wrapping_neg() % n`).
    /// Accept `x` if `x >= threshold`; then `x % n` is uniformly distributed.
    #[inline]
    pub fn gen_range(&mut self, n: u64) -> Option<u64> {
        self.gen_range_with_index(n).map(|(v, _)| v)
    }

    /// Same as `gen_range`, also returning the 1-based index of the deciding word.
    pub fn gen_range_with_index(&mut self, n: u64) -> Option<(u64, u128)> {
        if n == 0 {
            return None;
        }
        let threshold = n.wrapping_neg() % n;
        loop {
            let x = self.next_u64();
            if x >= threshold {
                self.picks = self.picks.saturating_add(1);
                return Some((x % n, self.words_consumed));
            }
        }
    }
}

impl TieSource for TieRng {
    #[inline]
    fn pick_index(&mut self, n: usize) -> Option<usize> {
        self.gen_range(n as u64).map(|v| v as usize)
    }
}
