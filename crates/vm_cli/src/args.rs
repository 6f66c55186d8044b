// crates/vm_cli/src/args.rs
//
// Argument surface. Two ways to name the inputs:
//   vm CANDIDATES BALLOTS SEATS [flags]
//   vm --manifest election.json [--seats N] [flags]
// Paths must be local (no scheme://). Seed is decimal u64 or 0x-hex.

use clap::{ArgAction, Parser, ValueEnum};
use std::path::{Path, PathBuf};

use vm_core::variables::parse_seats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderKind {
    Text,
    Json,
}

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "vm",
    disable_help_subcommand = true,
    about = "Count a multi-winner ranked-choice election (Droop quota, Condorcet last-place tie-break)"
)]
pub struct Args {
    /// Candidate list: one name per line.
    #[arg(conflicts_with = "manifest", requires = "ballots")]
    pub candidates: Option<PathBuf>,
    /// Ballots CSV: header row, then `voter,first,second,...`.
    #[arg(requires = "winners")]
    pub ballots: Option<PathBuf>,
    /// Number of winners.
    #[arg(value_name = "SEATS")]
    pub winners: Option<String>,

    /// Election manifest JSON naming the input files.
    #[arg(long)]
    pub manifest: Option<PathBuf>,
    /// Number of winners, overriding the manifest.
    #[arg(long = "seats", value_name = "N", requires = "manifest")]
    pub seats_flag: Option<String>,

    /// Tie RNG seed. Accepts decimal u64 or 0x-hex (≤16 hex digits).
    #[arg(long, value_parser = parse_seed)]
    pub seed: Option<u64>,
    /// Directory for result.json and run_record.json. Omit to print only.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// How the report goes to stdout.
    #[arg(long, value_enum, default_value = "text")]
    pub render: RenderKind,
    /// Load and check the inputs, do not count.
    #[arg(long)]
    pub validate_only: bool,
    /// Print nothing on stdout.
    #[arg(long)]
    pub quiet: bool,
    /// More log output on stderr (-v info, -vv debug). RUST_LOG wins when set.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Validated inputs handed to main.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inputs {
    Files { candidates: PathBuf, ballots: PathBuf, seats: u32 },
    Manifest { path: PathBuf, seats: Option<u32> },
}

#[derive(Debug)]
pub enum CliError {
    Missing(&'static str),
    NonLocalPath(String),
    NotFound(String),
    BadSeats(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            Missing(s) => write!(
                f,
                "missing {s}; give CANDIDATES BALLOTS SEATS or --manifest. Run 'vm --help' for more information."
            ),
            NonLocalPath(p) => write!(f, "path must be local file (no scheme): {p}"),
            NotFound(p) => write!(f, "unable to open {p}; please ensure the path is correct"),
            BadSeats(s) => write!(f, "Invalid winner count argument: {s:?}"),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Missing files are I/O failures; everything else is a usage error.
    pub fn is_io(&self) -> bool {
        matches!(self, CliError::NotFound(_))
    }
}

/// Seed parser: decimal u64 or 0x-hex (1..=16 nybbles).
pub fn parse_seed(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty seed".into());
    }
    if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if rest.is_empty() || rest.len() > 16 || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("hex seed must be 1..16 hex digits".into());
        }
        u64::from_str_radix(rest, 16).map_err(|_| "hex seed out of range".into())
    } else {
        s.parse::<u64>().map_err(|_| "decimal seed must be a valid u64".into())
    }
}

#[inline]
fn has_scheme(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.contains("://") || lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("file:")
}

#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if has_scheme(s) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

fn ensure_local_exists(p: &Path, label: &'static str) -> Result<(), CliError> {
    ensure_local_path(p)?;
    match std::fs::metadata(p) {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(CliError::NotFound(format!("the {label} file {}", p.display()))),
    }
}

fn seats_from(raw: &str) -> Result<u32, CliError> {
    parse_seats(raw).map_err(|_| CliError::BadSeats(raw.to_string()))
}

impl Args {
    /// Check paths and seat count and pick the input mode.
    pub fn inputs(&self) -> Result<Inputs, CliError> {
        if let Some(out) = &self.out {
            ensure_local_path(out)?;
        }
        if let Some(manifest) = &self.manifest {
            ensure_local_exists(manifest, "manifest")?;
            let seats = self.seats_flag.as_deref().map(seats_from).transpose()?;
            return Ok(Inputs::Manifest { path: manifest.clone(), seats });
        }
        let candidates = self.candidates.as_ref().ok_or(CliError::Missing("CANDIDATES"))?;
        let ballots = self.ballots.as_ref().ok_or(CliError::Missing("BALLOTS"))?;
        let raw = self.winners.as_deref().ok_or(CliError::Missing("SEATS"))?;
        // Seat count is checked first so a typo is reported before any file access.
        let seats = seats_from(raw)?;
        ensure_local_exists(candidates, "candidate")?;
        ensure_local_exists(ballots, "vote")?;
        Ok(Inputs::Files { candidates: candidates.clone(), ballots: ballots.clone(), seats })
    }
}

pub fn parse_and_validate() -> Result<(Args, Inputs), CliError> {
    let args = Args::parse();
    let inputs = args.inputs()?;
    Ok((args, inputs))
}
