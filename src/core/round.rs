// src/core/round.rs — Pieces shared by the reduction strategies

use super::types::{CandidateSet, Move, Partition, ProgressEvent, TrialOutcome};
use crate::infra::errors::TrimError;
use crate::oracle::{Evaluation, Oracle, OracleSession};

/// What a round decided about the current set.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundDecision {
    /// Replace the current set with `kept`.
    Shrink { kept: CandidateSet, improvement: f64 },
    /// Nothing beat the threshold; the current set stands.
    Keep { best_improvement: Option<f64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundResult {
    pub decision: RoundDecision,
    pub evaluations: u32,
    pub failed_evaluations: u32,
}

/// Per-round context handed to a strategy.
pub struct RoundContext<'a> {
    pub round: u32,
    pub baseline: f64,
    pub min_improvement: f64,
    pub emit: &'a dyn Fn(ProgressEvent),
}

/// Evaluate one partition against the baseline and report it.
pub async fn evaluate_partition<O: Oracle>(
    session: &mut OracleSession<O>,
    ctx: &RoundContext<'_>,
    trial: u32,
    partition: Partition,
    moves: &[Move],
) -> Result<TrialOutcome, TrimError> {
    let outcome = match session.evaluate(moves).await? {
        Evaluation::Measured(value) => TrialOutcome {
            trial,
            partition,
            moves: moves.to_vec(),
            measured: Some(value),
            improvement: Some(ctx.baseline - value),
            error: None,
        },
        Evaluation::Failed(e) => TrialOutcome {
            trial,
            partition,
            moves: moves.to_vec(),
            measured: None,
            improvement: None,
            error: Some(e.to_string()),
        },
    };

    tracing::debug!(
        round = ctx.round,
        trial,
        partition = %partition,
        size = moves.len(),
        improvement = ?outcome.improvement,
        "Partition evaluated"
    );
    (ctx.emit)(ProgressEvent::Evaluated {
        round: ctx.round,
        trial,
        partition,
        size: moves.len(),
        improvement: outcome.improvement,
    });
    Ok(outcome)
}

/// Strict improvement over the threshold; failed partitions never pass.
pub fn passes(outcome: &TrialOutcome, min_improvement: f64) -> bool {
    outcome.improvement.is_some_and(|i| i > min_improvement)
}
