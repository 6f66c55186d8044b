//! crates/vm_core/src/ids.rs
//! Candidate identity and output IDs (`RES:`, `RUN:`).
//! Deterministic, strict shapes; no I/O.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::CoreError;

const HEX64_LEN: usize = 64;
const MAX_NAME_LEN: usize = 256;

/// Lowercase hex of any length.
#[inline]
fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Lowercase hex, exactly 64 chars.
#[inline]
pub fn is_valid_sha256(s: &str) -> bool {
    s.len() == HEX64_LEN && is_lower_hex(s)
}

/// "YYYY-MM-DDTHH:MM:SSZ" (length 20).
fn is_ts_utc_z(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() != 20 {
        return false;
    }
    b.iter().enumerate().all(|(i, c)| match i {
        4 | 7 => *c == b'-',
        10 => *c == b'T',
        13 | 16 => *c == b':',
        19 => *c == b'Z',
        _ => c.is_ascii_digit(),
    })
}

/// A candidate name is usable when it is non-empty, already trimmed, free of
/// control characters, and contains no comma (the ballot field separator).
#[inline]
pub fn is_valid_candidate_name(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_NAME_LEN
        && s.trim() == s
        && !s.chars().any(|c| c == ',' || c.is_control())
}

// === CandidateId ===

/// Candidate identity: the name as it appears in the candidate list.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CandidateId(String);

impl CandidateId {
    /// Build from raw text, trimming surrounding whitespace first.
    pub fn new(raw: &str) -> Result<Self, CoreError> {
        raw.trim().parse()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CandidateId {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_valid_candidate_name(s) {
            Ok(CandidateId(s.to_owned()))
        } else {
            Err(CoreError::InvalidCandidate)
        }
    }
}

impl TryFrom<&str> for CandidateId {
    type Error = CoreError;
    #[inline]
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for CandidateId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        use serde::de::{Error as DeError, Unexpected};
        let s = String::deserialize(d)?;
        s.parse()
            .map_err(|_| D::Error::invalid_value(Unexpected::Str(&s), &"trimmed candidate name without commas"))
    }
}

// === ResultId / RunId ===

/// "RES:" + 64-hex (lowercase)
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ResultId(String);

impl ResultId {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResultId {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("RES:").ok_or(CoreError::InvalidId)?;
        if is_valid_sha256(rest) {
            Ok(ResultId(s.to_owned()))
        } else {
            Err(CoreError::InvalidId)
        }
    }
}

/// "RUN:" + "<YYYY-MM-DDTHH:MM:SSZ>" + "-" + "<8..64-hex lowercase>"
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RunId(String);

impl RunId {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RunId {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("RUN:").ok_or(CoreError::InvalidId)?;
        // The timestamp itself contains dashes; the hash starts after char 20.
        if rest.len() < 22 || !rest.is_char_boundary(20) {
            return Err(CoreError::InvalidId);
        }
        let (ts, tail) = rest.split_at(20);
        if !is_ts_utc_z(ts) {
            return Err(CoreError::InvalidTimestamp);
        }
        let hash = tail.strip_prefix('-').ok_or(CoreError::InvalidId)?;
        if !(8..=64).contains(&hash.len()) || !is_lower_hex(hash) {
            return Err(CoreError::InvalidId);
        }
        Ok(RunId(s.to_owned()))
    }
}
