//! JSON rendering of the report model: summary → rounds → winners → integrity.
//!
//! Without `serde_json/preserve_order` the object keys come out sorted, which
//! is what the canonical writer expects anyway.

use serde_json::{json, Value};

use crate::ReportModel;

pub fn render_report_json(m: &ReportModel) -> Value {
    let rounds: Vec<Value> = m
        .rounds
        .iter()
        .map(|r| {
            let tally: Vec<Value> = r
                .tally
                .iter()
                .map(|(candidate, total)| json!({ "candidate": candidate, "total": total }))
                .collect();
            json!({
                "round": r.number,
                "tally": tally,
                "events": r.events,
            })
        })
        .collect();

    json!({
        "summary": m.summary,
        "rounds": rounds,
        "winners": m.winners,
        "integrity": m.integrity,
    })
}
