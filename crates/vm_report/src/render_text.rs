//! Console rendering of a counted election, one block per round:
//!
//! ```text
//! Round 1 vote counts:
//! A: 1.0 | B: 1.0 | C: 1.0 |
//! Breaking last place tie between: A, B, C
//! C has been eliminated with 1.0 votes.
//! ```
//!
//! followed by a blank line, `Winners:` and the comma-joined list.

use std::fmt::Write as _;

use crate::{format_votes, EventLine, ReportModel};

pub fn render_text(m: &ReportModel) -> String {
    let mut out = String::new();
    for round in &m.rounds {
        // Writing into a String cannot fail.
        let _ = writeln!(out);
        let _ = writeln!(out, "Round {} vote counts:", round.number);
        let counts: Vec<String> = round
            .tally
            .iter()
            .map(|(name, total)| format!("{name}: {} |", format_votes(*total)))
            .collect();
        let _ = writeln!(out, "{}", counts.join(" "));
        for ev in &round.events {
            let _ = writeln!(out, "{}", event_line(ev));
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Winners:");
    let _ = writeln!(out, "{}", m.winners.join(", "));
    out
}

fn event_line(ev: &EventLine) -> String {
    match ev {
        EventLine::Won { candidate, total } => {
            format!("{candidate} has won with {} votes.", format_votes(*total))
        }
        EventLine::WonLastRound { candidate } => format!("{candidate} has won in the last round."),
        EventLine::Eliminated { candidate, total } => {
            format!("{candidate} has been eliminated with {} votes.", format_votes(*total))
        }
        EventLine::TieBreak { contenders, .. } => {
            format!("Breaking last place tie between: {}", contenders.join(", "))
        }
    }
}
