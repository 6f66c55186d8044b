// crates/vm_io/src/manifest.rs
//
// Election manifest: a small JSON file naming the inputs of one run.
//
// • Paths are local only: anything with a scheme ("://", "http:", "https:") is rejected.
// • Relative paths resolve against the manifest's own directory.
// • `seats` and `tie_seed` are optional; command-line values override them.
// • Optional `inputs_sha256` pins the raw bytes of each input file.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{hasher, looks_like_url_strict, IoError};

const MAX_MANIFEST_BYTES: u64 = 1024 * 1024;

/// External manifest as written by users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElectionManifest {
    pub candidates_path: String,
    pub ballots_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seats: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie_seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs_sha256: Option<PinnedDigests>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PinnedDigests {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ballots: Option<String>,
}

/// Manifest with paths resolved and checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedManifest {
    pub candidates_path: PathBuf,
    pub ballots_path: PathBuf,
    pub seats: Option<u32>,
    pub tie_seed: Option<u64>,
}

#[inline]
fn is_lower_hex_64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[inline]
fn join_under(base: &Path, rel: &str) -> PathBuf {
    let p = Path::new(rel);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

/// Shape and offline policy. No I/O.
pub fn validate_manifest(man: &ElectionManifest) -> Result<(), IoError> {
    for (label, path) in [("candidates_path", &man.candidates_path), ("ballots_path", &man.ballots_path)] {
        if path.trim().is_empty() {
            return Err(IoError::Manifest(format!("{label} must not be empty")));
        }
        if looks_like_url_strict(path) {
            return Err(IoError::Manifest(format!("{label} must be a local path: {path}")));
        }
    }
    if man.seats == Some(0) {
        return Err(IoError::Manifest("seats must be at least 1".into()));
    }
    if let Some(pins) = &man.inputs_sha256 {
        for (label, pin) in [("candidates", &pins.candidates), ("ballots", &pins.ballots)] {
            if let Some(hex) = pin {
                if !is_lower_hex_64(hex) {
                    return Err(IoError::Manifest(format!("inputs_sha256.{label} must be 64 lowercase hex")));
                }
            }
        }
    }
    Ok(())
}

fn must_exist_file(label: &str, p: &Path) -> Result<(), IoError> {
    let md = fs::metadata(p).map_err(|e| IoError::Read {
        path: p.display().to_string(),
        msg: format!("{label}: {e}"),
    })?;
    if !md.is_file() {
        return Err(IoError::Manifest(format!("{label} is not a file: {}", p.display())));
    }
    Ok(())
}

fn verify_pin(label: &str, path: &Path, expected: Option<&String>) -> Result<(), IoError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let actual = hasher::sha256_file(path)?;
    if &actual != expected {
        return Err(IoError::Manifest(format!(
            "sha256 mismatch for {label}: expected {expected}, found {actual}"
        )));
    }
    Ok(())
}

/// Resolve under `base_dir`, check both inputs exist, and verify any pins.
pub fn resolve_paths(base_dir: &Path, man: &ElectionManifest) -> Result<ResolvedManifest, IoError> {
    let candidates_path = join_under(base_dir, man.candidates_path.trim());
    let ballots_path = join_under(base_dir, man.ballots_path.trim());
    must_exist_file("candidates_path", &candidates_path)?;
    must_exist_file("ballots_path", &ballots_path)?;

    if let Some(pins) = &man.inputs_sha256 {
        verify_pin("candidates", &candidates_path, pins.candidates.as_ref())?;
        verify_pin("ballots", &ballots_path, pins.ballots.as_ref())?;
    }

    Ok(ResolvedManifest {
        candidates_path,
        ballots_path,
        seats: man.seats,
        tie_seed: man.tie_seed,
    })
}

pub fn parse_manifest(bytes: &[u8]) -> Result<ElectionManifest, IoError> {
    let man: ElectionManifest = serde_json::from_slice(bytes)?;
    validate_manifest(&man)?;
    Ok(man)
}

/// Load → validate → resolve relative to the manifest's directory.
pub fn load_manifest(manifest_path: &Path) -> Result<ResolvedManifest, IoError> {
    let read_err = |e: std::io::Error| IoError::Read {
        path: manifest_path.display().to_string(),
        msg: e.to_string(),
    };
    let mut buf = Vec::new();
    fs::File::open(manifest_path)
        .map_err(read_err)?
        .take(MAX_MANIFEST_BYTES)
        .read_to_end(&mut buf)
        .map_err(read_err)?;

    let man = parse_manifest(&buf)?;
    let base = manifest_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    tracing::debug!(manifest = %manifest_path.display(), "manifest parsed");
    resolve_paths(&base, &man)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let p = dir.join(name);
        fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn relative_paths_resolve_next_to_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "c.txt", "A\nB\n");
        write(dir.path(), "v.csv", "h\n");
        let m = write(
            dir.path(),
            "election.json",
            r#"{"candidates_path":"c.txt","ballots_path":"v.csv","seats":1,"tie_seed":7}"#,
        );
        let r = load_manifest(&m).unwrap();
        assert_eq!(r.candidates_path, dir.path().join("c.txt"));
        assert_eq!(r.seats, Some(1));
        assert_eq!(r.tie_seed, Some(7));
    }

    #[test]
    fn urls_and_unknown_fields_rejected() {
        let url = br#"{"candidates_path":"https://x/c.txt","ballots_path":"v.csv"}"#;
        assert!(matches!(parse_manifest(url), Err(IoError::Manifest(_))));
        let extra = br#"{"candidates_path":"c","ballots_path":"v","winners":2}"#;
        assert!(matches!(parse_manifest(extra), Err(IoError::Json { .. })));
        let zero = br#"{"candidates_path":"c","ballots_path":"v","seats":0}"#;
        assert!(parse_manifest(zero).is_err());
    }

    #[test]
    fn pinned_digest_must_match() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "c.txt", "A\n");
        write(dir.path(), "v.csv", "h\n");
        let good = hasher::sha256_hex(b"A\n");
        let bad = "0".repeat(64);
        let ok = ElectionManifest {
            candidates_path: "c.txt".into(),
            ballots_path: "v.csv".into(),
            seats: None,
            tie_seed: None,
            inputs_sha256: Some(PinnedDigests { candidates: Some(good), ballots: None }),
        };
        assert!(resolve_paths(dir.path(), &ok).is_ok());

        let mut wrong = ok.clone();
        wrong.inputs_sha256 = Some(PinnedDigests { candidates: Some(bad), ballots: None });
        let err = resolve_paths(dir.path(), &wrong).unwrap_err();
        assert!(err.to_string().contains("sha256 mismatch for candidates"), "{err}");
    }

    #[test]
    fn missing_input_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let man = ElectionManifest {
            candidates_path: "nope.txt".into(),
            ballots_path: "nope.csv".into(),
            seats: None,
            tie_seed: None,
            inputs_sha256: None,
        };
        assert!(matches!(resolve_paths(dir.path(), &man), Err(IoError::Read { .. })));
    }
}
