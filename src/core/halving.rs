// src/core/halving.rs — Randomized halving round
//
// Each trial shuffles the current set, splits it into a left half of
// ceil(n/2) moves and a right half of the rest, and evaluates both. The
// single best-improving half across all trials wins the round. Ties keep the
// earlier trial, and within a trial the left half.

use rand::seq::SliceRandom;
use rand::Rng;

use super::round::{evaluate_partition, passes, RoundContext, RoundDecision, RoundResult};
use super::types::{CandidateSet, Half, Move, Partition, TrialOutcome};
use crate::infra::errors::TrimError;
use crate::oracle::{Oracle, OracleSession};

/// Split at ceil(n/2): the left half gets the extra move of an odd set.
pub fn split_halves(moves: &[Move]) -> (&[Move], &[Move]) {
    moves.split_at(moves.len().div_ceil(2))
}

/// Whether `candidate` should replace `best`. Strictly better only, so the
/// first of equal outcomes stays selected.
fn improves_on(candidate: &TrialOutcome, best: Option<&TrialOutcome>) -> bool {
    if candidate.improvement.is_none() {
        return false;
    }
    match best {
        None => true,
        Some(b) => candidate.score() > b.score(),
    }
}

pub async fn run_round<O: Oracle, R: Rng + ?Sized>(
    session: &mut OracleSession<O>,
    rng: &mut R,
    current: &CandidateSet,
    trials: u32,
    ctx: &RoundContext<'_>,
) -> Result<RoundResult, TrimError> {
    let mut order: Vec<Move> = current.moves().to_vec();
    let mut best: Option<TrialOutcome> = None;
    let mut evaluations = 0;
    let mut failed = 0;

    for trial in 0..trials {
        order.shuffle(rng);
        let (left, right) = split_halves(&order);

        for (half, moves) in [(Half::Left, left), (Half::Right, right)] {
            let outcome =
                evaluate_partition(session, ctx, trial, Partition::Half(half), moves).await?;
            evaluations += 1;
            if outcome.improvement.is_none() {
                failed += 1;
            }
            if improves_on(&outcome, best.as_ref()) {
                best = Some(outcome);
            }
        }
    }

    let decision = match best {
        Some(b) if passes(&b, ctx.min_improvement) => {
            tracing::info!(
                round = ctx.round,
                trial = b.trial,
                partition = %b.partition,
                kept = b.moves.len(),
                improvement = b.score(),
                "Round accepted"
            );
            RoundDecision::Shrink {
                improvement: b.score(),
                kept: CandidateSet::new(b.moves),
            }
        }
        other => {
            let best_improvement = other.and_then(|b| b.improvement);
            tracing::info!(
                round = ctx.round,
                best_improvement = ?best_improvement,
                "No half improved on the baseline"
            );
            RoundDecision::Keep { best_improvement }
        }
    };

    Ok(RoundResult {
        decision,
        evaluations,
        failed_evaluations: failed,
    })
}
