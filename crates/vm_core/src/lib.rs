//! vm_core — Core types, run parameters, and the seedable tie RNG.
//!
//! This crate is **I/O-free**. It defines the stable types shared across the
//! tabulator (`vm_io`, `vm_algo`, `vm_pipeline`, `vm_report`, `vm_cli`).
//!
//! - Candidate identity: `CandidateId`
//! - Output IDs: `RES:`, `RUN:`
//! - Run parameters: `Params` (seat count, optional tie seed)
//! - Seedable RNG (ChaCha20) for **ties only**, behind the `TieSource` seam
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod errors {
    use core::fmt;

    /// Minimal error set for core-domain validation & parsing.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum CoreError {
        InvalidId,
        InvalidCandidate,
        InvalidTimestamp,
        DomainOutOfRange(&'static str),
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::InvalidId => write!(f, "invalid id"),
                CoreError::InvalidCandidate => write!(f, "invalid candidate name"),
                CoreError::InvalidTimestamp => write!(f, "invalid timestamp"),
                CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub mod ids;
pub mod rng;
pub mod variables;

pub use errors::CoreError;
pub use ids::{CandidateId, ResultId, RunId};
pub use rng::{TieRng, TieSource};
pub use variables::Params;
