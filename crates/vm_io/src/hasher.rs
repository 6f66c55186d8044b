//! crates/vm_io/src/hasher.rs
//!
//! Hashing and ID builders for inputs and canonical artifacts.
//!
//! - Use `sha256_canonical(..)` for JSON values/structs (goes through canonical_json).
//! - Use `sha256_hex(..)`, `sha256_stream(..)`, or `sha256_file(..)` for raw bytes/files.
//! - `RES:` ids hash the canonical result; `RUN:` ids prefix a UTC timestamp.
//! - Hex digests are lowercase.

#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use vm_core::ids::{ResultId, RunId};

use crate::canonical_json::canonical_bytes_of;

#[derive(Error, Debug)]
pub enum HashError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("canonicalization error: {0}")]
    Canonical(String),

    #[error("malformed id: {0}")]
    BadId(String),
}

fn canon<T: Serialize>(value: &T) -> Result<Vec<u8>, HashError> {
    canonical_bytes_of(value).map_err(|e| HashError::Canonical(e.to_string()))
}

/// SHA-256 over raw bytes, lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over canonical JSON bytes of any serializable value.
pub fn sha256_canonical<T: Serialize>(value: &T) -> Result<String, HashError> {
    Ok(sha256_hex(&canon(value)?))
}

/// SHA-256 over a reader stream (raw, not canonicalized).
pub fn sha256_stream<R: Read>(reader: &mut R) -> Result<String, HashError> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// SHA-256 over a file's raw bytes.
pub fn sha256_file(path: &Path) -> Result<String, HashError> {
    let mut r = BufReader::new(File::open(path)?);
    sha256_stream(&mut r)
}

/// `RES:<hex>` over the canonical bytes of `value`.
pub fn res_id_from_canonical<T: Serialize>(value: &T) -> Result<ResultId, HashError> {
    let s = format!("RES:{}", sha256_canonical(value)?);
    s.parse().map_err(|_| HashError::BadId(s))
}

/// `RUN:<YYYY-MM-DDTHH:MM:SSZ>-<hex>` over the canonical bytes of `value`.
pub fn run_id_from_canonical<T: Serialize>(timestamp_utc: &str, value: &T) -> Result<RunId, HashError> {
    let s = format!("RUN:{timestamp_utc}-{}", sha256_canonical(value)?);
    s.parse().map_err(|_| HashError::BadId(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_encoding_is_lowercase() {
        let h = sha256_hex(b"abc");
        assert_eq!(h, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[test]
    fn canonical_hashing_ignores_key_order() {
        #[derive(Serialize)]
        struct T {
            b: u32,
            a: u32,
        }
        let h1 = sha256_canonical(&T { b: 2, a: 1 }).unwrap();
        let h2 = sha256_canonical(&json!({"a": 1, "b": 2})).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn stream_matches_bytes() {
        let mut r: &[u8] = b"hello world";
        assert_eq!(sha256_stream(&mut r).unwrap(), sha256_hex(b"hello world"));
    }

    #[test]
    fn ids_have_expected_shape() {
        let res = res_id_from_canonical(&json!({"winners": ["A"]})).unwrap();
        assert!(res.as_str().starts_with("RES:"));
        let run = run_id_from_canonical("2025-08-12T10:00:00Z", &json!({"x": 1})).unwrap();
        assert!(run.as_str().starts_with("RUN:2025-08-12T10:00:00Z-"));
        assert!(run_id_from_canonical("yesterday", &json!({})).is_err());
    }
}
