// src/core/report.rs — Final outcome of a trimming run

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

use super::store::format_moves;
use super::types::{Move, RoundSummary, StopReason};
use crate::infra::config::Strategy;
use crate::oracle::session::CallStats;

#[derive(Debug, Clone, Serialize)]
pub struct TrimReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub strategy: Strategy,
    pub seed: Option<u64>,
    pub target_size: usize,
    /// `None` only when the run was cancelled before the baseline was taken.
    pub baseline: Option<f64>,
    pub initial_size: usize,
    pub final_size: usize,
    pub stop_reason: StopReason,
    /// Best improvement measured in the last round, accepted or not.
    pub last_improvement: Option<f64>,
    pub rounds: Vec<RoundSummary>,
    pub oracle_calls: CallStats,
    pub final_moves: Vec<Move>,
}

impl TrimReport {
    /// The final set in the persisted list format.
    pub fn moves_listing(&self) -> String {
        format_moves(&self.final_moves)
    }

    /// Human-readable summary.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Stopped: {} ({} -> {} moves, target {})",
            self.stop_reason, self.initial_size, self.final_size, self.target_size
        );
        match self.baseline {
            Some(b) => {
                let _ = writeln!(out, "Baseline: {b:.4}");
            }
            None => {
                let _ = writeln!(out, "Baseline: not measured");
            }
        }
        match self.last_improvement {
            Some(i) => {
                let _ = writeln!(out, "Last round improvement: {i:.4}");
            }
            None => {
                let _ = writeln!(out, "Last round improvement: n/a");
            }
        }
        for r in &self.rounds {
            let verdict = if r.accepted { "kept" } else { "rejected" };
            let best = r
                .best_improvement
                .map(|i| format!("{i:.4}"))
                .unwrap_or_else(|| "none".into());
            let _ = writeln!(
                out,
                "  round {}: {} -> {} ({verdict}, best {best}, {} evaluation(s), {} failed)",
                r.round, r.size_before, r.size_after, r.evaluations, r.failed_evaluations
            );
        }
        let _ = writeln!(
            out,
            "Oracle calls: {} apply, {} measure, {} reset",
            self.oracle_calls.applies, self.oracle_calls.measurements, self.oracle_calls.resets
        );
        out
    }

    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
