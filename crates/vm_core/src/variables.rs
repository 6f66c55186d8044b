//! variables.rs — Run parameters with domain checks.
//!
//! `seats` must lie in `[1, candidate_count]`; that check needs the candidate
//! list, so it happens in `validate_domains` rather than at construction.
//! `tie_seed` only matters when a tie falls through to the random step.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct Params {
    /// Number of winners to elect.
    pub seats: u32,
    /// Seed for the random tie step; `None` lets the caller pick one.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub tie_seed: Option<u64>,
}

impl Params {
    pub fn new(seats: u32) -> Self {
        Self { seats, tie_seed: None }
    }

    pub fn with_tie_seed(mut self, seed: u64) -> Self {
        self.tie_seed = Some(seed);
        self
    }

    /// Seat count against the candidate list it will be applied to.
    pub fn validate_domains(&self, candidate_count: usize) -> Result<(), CoreError> {
        if candidate_count == 0 {
            return Err(CoreError::DomainOutOfRange("candidates"));
        }
        if self.seats == 0 || self.seats as usize > candidate_count {
            return Err(CoreError::DomainOutOfRange("seats"));
        }
        Ok(())
    }
}

/// Parse a seat count the way users type it ("3", " 3 "). Only the digits
/// check happens here; range checking needs the candidate count.
pub fn parse_seats(raw: &str) -> Result<u32, CoreError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| CoreError::DomainOutOfRange("seats"))
}
