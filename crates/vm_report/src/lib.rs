//! vm_report — report model built from a counted `result.json` (and optionally
//! its `run_record.json`), plus text and JSON renderers.
//!
//! No I/O here. Callers pass artifacts already parsed into `serde_json::Value`
//! so this crate does not depend on the pipeline's concrete types.

#![deny(unsafe_code)]

use std::fmt;

use serde_json::Value;
use vm_core::ids::{ResultId, RunId};

pub mod render_text;
#[cfg(feature = "render_json")]
pub mod render_json;

pub use render_text::render_text;
#[cfg(feature = "render_json")]
pub use render_json::render_report_json;

pub type ResultArtifact = Value;
pub type RunRecordArtifact = Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    MissingField(&'static str),
    BadId(&'static str),
    UnknownEvent(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::MissingField(p) => write!(f, "artifact field missing or mistyped: {p}"),
            ReportError::BadId(p) => write!(f, "artifact id malformed at {p}"),
            ReportError::UnknownEvent(k) => write!(f, "unknown round event kind: {k}"),
        }
    }
}

impl std::error::Error for ReportError {}

// ===== Model =====

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ReportModel {
    pub summary: SectionSummary,
    pub rounds: Vec<SectionRound>,
    pub winners: Vec<String>,
    pub integrity: SectionIntegrity,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SectionSummary {
    pub seats: u64,
    pub quota: f64,
    pub total_ballots: u64,
    pub candidates: Vec<String>,
    pub exhausted_weight: f64,
    pub dropped_preferences: u64,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SectionRound {
    pub number: u64,
    pub tally: Vec<(String, f64)>,
    pub events: Vec<EventLine>,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[cfg_attr(feature = "render_json", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Clone, Debug, PartialEq)]
pub enum EventLine {
    Won { candidate: String, total: f64 },
    WonLastRound { candidate: String },
    Eliminated { candidate: String, total: f64 },
    TieBreak { contenders: Vec<String>, resolved_by: String },
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SectionIntegrity {
    pub result_id: String,
    pub run_id: Option<String>,
    pub tie_seed: Option<u64>,
    pub random_draws: Option<u64>,
}

// ===== Pointer helpers =====

#[inline]
pub fn j_str(v: &Value, ptr: &str) -> Option<String> {
    v.pointer(ptr).and_then(|x| x.as_str()).map(|s| s.to_string())
}

#[inline]
pub fn j_u64(v: &Value, ptr: &str) -> Option<u64> {
    v.pointer(ptr).and_then(|x| x.as_u64())
}

#[inline]
pub fn j_f64(v: &Value, ptr: &str) -> Option<f64> {
    v.pointer(ptr).and_then(|x| x.as_f64())
}

fn j_names(v: &Value, ptr: &'static str) -> Result<Vec<String>, ReportError> {
    v.pointer(ptr)
        .and_then(|x| x.as_array())
        .ok_or(ReportError::MissingField(ptr))?
        .iter()
        .map(|x| x.as_str().map(str::to_string).ok_or(ReportError::MissingField(ptr)))
        .collect()
}

fn need<T>(x: Option<T>, ptr: &'static str) -> Result<T, ReportError> {
    x.ok_or(ReportError::MissingField(ptr))
}

// ===== Mappers =====

pub fn map_summary(result: &Value) -> Result<SectionSummary, ReportError> {
    Ok(SectionSummary {
        seats: need(j_u64(result, "/seats"), "/seats")?,
        quota: need(j_f64(result, "/quota"), "/quota")?,
        total_ballots: need(j_u64(result, "/total_ballots"), "/total_ballots")?,
        candidates: j_names(result, "/candidates")?,
        exhausted_weight: j_f64(result, "/exhausted_weight").unwrap_or(0.0),
        dropped_preferences: j_u64(result, "/dropped_preferences").unwrap_or(0),
    })
}

fn map_event(ev: &Value) -> Result<Option<EventLine>, ReportError> {
    let kind = need(j_str(ev, "/kind"), "/rounds/*/events/*/kind")?;
    let candidate = || need(j_str(ev, "/candidate"), "/rounds/*/events/*/candidate");
    let line = match kind.as_str() {
        // A winner without a surplus fraction was seated by the last-round shortcut.
        "winner" => match ev.get("surplus_fraction") {
            Some(_) => EventLine::Won {
                candidate: candidate()?,
                total: need(j_f64(ev, "/total"), "/rounds/*/events/*/total")?,
            },
            None => EventLine::WonLastRound { candidate: candidate()? },
        },
        "eliminated" => EventLine::Eliminated {
            candidate: candidate()?,
            total: need(j_f64(ev, "/total"), "/rounds/*/events/*/total")?,
        },
        "tie_break" => EventLine::TieBreak {
            contenders: j_names(ev, "/contenders")?,
            resolved_by: need(j_str(ev, "/resolved_by"), "/rounds/*/events/*/resolved_by")?,
        },
        "final_winners" => return Ok(None),
        other => return Err(ReportError::UnknownEvent(other.to_string())),
    };
    Ok(Some(line))
}

pub fn map_rounds(result: &Value) -> Result<Vec<SectionRound>, ReportError> {
    let rounds = need(result.pointer("/rounds").and_then(|x| x.as_array()), "/rounds")?;
    let mut out = Vec::with_capacity(rounds.len());
    for r in rounds {
        let tally = need(r.pointer("/tally").and_then(|x| x.as_array()), "/rounds/*/tally")?
            .iter()
            .map(|t| {
                Ok((
                    need(j_str(t, "/candidate"), "/rounds/*/tally/*/candidate")?,
                    need(j_f64(t, "/total"), "/rounds/*/tally/*/total")?,
                ))
            })
            .collect::<Result<Vec<_>, ReportError>>()?;
        let mut events = Vec::new();
        for ev in r.pointer("/events").and_then(|x| x.as_array()).into_iter().flatten() {
            if let Some(line) = map_event(ev)? {
                events.push(line);
            }
        }
        out.push(SectionRound {
            number: need(j_u64(r, "/round"), "/rounds/*/round")?,
            tally,
            events,
        });
    }
    Ok(out)
}

pub fn map_integrity(result: &Value, run: Option<&Value>) -> Result<SectionIntegrity, ReportError> {
    let result_id = need(j_str(result, "/id"), "/id")?;
    result_id.parse::<ResultId>().map_err(|_| ReportError::BadId("/id"))?;

    let run_id = match run.and_then(|r| j_str(r, "/id")) {
        Some(id) => {
            id.parse::<RunId>().map_err(|_| ReportError::BadId("run_record/id"))?;
            Some(id)
        }
        None => None,
    };
    if let Some(echoed) = run.and_then(|r| j_str(r, "/outputs/result_id")) {
        if echoed != result_id {
            return Err(ReportError::BadId("run_record/outputs/result_id"));
        }
    }
    Ok(SectionIntegrity {
        result_id,
        run_id,
        tie_seed: run.and_then(|r| j_u64(r, "/tie/seed")),
        random_draws: run.and_then(|r| j_u64(r, "/tie/random_draws")),
    })
}

/// Build the report model. Nothing is recounted; every figure is echoed from
/// the artifacts.
pub fn build_report_model(
    result: &ResultArtifact,
    run: Option<&RunRecordArtifact>,
) -> Result<ReportModel, ReportError> {
    Ok(ReportModel {
        summary: map_summary(result)?,
        rounds: map_rounds(result)?,
        winners: j_names(result, "/winners")?,
        integrity: map_integrity(result, run)?,
    })
}

/// Vote totals as the console shows them: whole numbers keep one decimal
/// (`3.0`), fractional ones print in full.
pub fn format_votes(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 {
        format!("{x:.1}")
    } else {
        format!("{x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn sample_result() -> Value {
        json!({
            "id": format!("RES:{}", "a".repeat(64)),
            "seats": 1,
            "quota": 1.5,
            "total_ballots": 3,
            "candidates": ["A", "B", "C"],
            "exhausted_weight": 0.0,
            "dropped_preferences": 0,
            "winners": ["B"],
            "rounds": [
                {
                    "round": 1,
                    "tally": [
                        {"candidate": "A", "total": 1.0},
                        {"candidate": "B", "total": 1.0},
                        {"candidate": "C", "total": 1.0}
                    ],
                    "events": [
                        {"kind": "tie_break", "contenders": ["A", "B", "C"], "resolved_by": "pairwise_wins"},
                        {"kind": "eliminated", "candidate": "C", "total": 1.0}
                    ],
                    "transfer": {"transferred": 1.0, "exhausted": 0.0, "ballots_moved": 1, "ballots_exhausted": 0}
                },
                {
                    "round": 2,
                    "tally": [
                        {"candidate": "A", "total": 1.0},
                        {"candidate": "B", "total": 2.0}
                    ],
                    "events": [
                        {"kind": "winner", "candidate": "B", "total": 2.0, "surplus_fraction": 0.16666666666666666},
                        {"kind": "final_winners", "winners": ["B"]}
                    ]
                }
            ]
        })
    }

    #[test]
    fn model_echoes_result() {
        let m = build_report_model(&sample_result(), None).unwrap();
        assert_eq!(m.summary.seats, 1);
        assert_eq!(m.rounds.len(), 2);
        assert_eq!(m.rounds[0].events.len(), 2);
        assert_eq!(
            m.rounds[1].events,
            vec![EventLine::Won { candidate: "B".into(), total: 2.0 }]
        );
        assert_eq!(m.winners, vec!["B".to_string()]);
        assert_eq!(m.integrity.run_id, None);
    }

    #[test]
    fn shortcut_winner_has_no_surplus() {
        let mut r = sample_result();
        r["rounds"][1]["events"][0] = json!({"kind": "winner", "candidate": "B", "total": 2.0});
        let m = build_report_model(&r, None).unwrap();
        assert_eq!(m.rounds[1].events[0], EventLine::WonLastRound { candidate: "B".into() });
    }

    #[test]
    fn missing_fields_and_bad_ids() {
        let mut r = sample_result();
        r.as_object_mut().unwrap().remove("quota");
        assert_eq!(build_report_model(&r, None), Err(ReportError::MissingField("/quota")));

        let mut r = sample_result();
        r["id"] = json!("RES:nothex");
        assert_eq!(build_report_model(&r, None), Err(ReportError::BadId("/id")));

        let mut r = sample_result();
        r["rounds"][0]["events"][0]["kind"] = json!("recount");
        assert!(matches!(build_report_model(&r, None), Err(ReportError::UnknownEvent(_))));
    }

    #[test]
    fn run_record_must_point_at_result() {
        let r = sample_result();
        let run = json!({
            "id": format!("RUN:2025-08-12T10:00:00Z-{}", "b".repeat(64)),
            "outputs": {"result_id": r["id"].clone()},
            "tie": {"seed": 7, "random_draws": 0}
        });
        let m = build_report_model(&r, Some(&run)).unwrap();
        assert_eq!(m.integrity.tie_seed, Some(7));
        assert!(m.integrity.run_id.is_some());

        let mut other = run.clone();
        other["outputs"]["result_id"] = json!(format!("RES:{}", "c".repeat(64)));
        assert!(build_report_model(&r, Some(&other)).is_err());
    }

    #[test]
    fn votes_format_like_console() {
        assert_eq!(format_votes(3.0), "3.0");
        assert_eq!(format_votes(0.5), "0.5");
        assert_eq!(format_votes(2.25), "2.25");
    }
}
