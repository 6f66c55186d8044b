//! crates/vm_io/src/lib.rs
//! I/O boundary of the tabulator.
//!
//! - Candidate list and ballot CSV ingestion (`loader`)
//! - JSON election manifest (`manifest`)
//! - Canonical JSON writing and SHA-256 ids (`canonical_json`, `hasher`)
//!
//! Everything that can fail on user input returns `IoError`; nothing here
//! panics on bad files.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for vm_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// An input file could not be opened or read.
    #[error("cannot read {path}: {msg}")]
    Read { path: String, msg: String },

    /// Filesystem / path errors while writing (create_dir_all, rename, fsync, etc.)
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON serialization/deserialization errors with a JSON Pointer hint.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// Manifest shape / offline policy / digest mismatches.
    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("hash error: {0}")]
    Hash(String),

    /// Malformed candidate or ballot content.
    #[error("invalid input: {0}")]
    Invalid(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json keeps line/column, not a pointer; report root.
        IoError::Json {
            pointer: "/".to_string(),
            msg: e.to_string(),
        }
    }
}

impl From<hasher::HashError> for IoError {
    fn from(e: hasher::HashError) -> Self {
        IoError::Hash(e.to_string())
    }
}

/// Returns true if `s` looks like a URL (any `<scheme>://`, or bare http(s):).
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    let s = s.trim();
    s.contains("://") || s.starts_with("http:") || s.starts_with("https:")
}

pub mod canonical_json;
pub mod hasher;
pub mod loader;
pub mod manifest;

pub mod prelude {
    pub use crate::loader::{load_election, BallotRecord, InputDigests, LoadedElection};
    pub use crate::manifest::{load_manifest, ElectionManifest, ResolvedManifest};
    pub use crate::{looks_like_url_strict, IoError, IoResult};
}
