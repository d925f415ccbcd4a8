// src/core/ddmin.rs — Delta-debugging round (opt-in, `strategy = "delta"`)
//
// Splits the set into `g` chunks and accepts the first chunk, then the first
// complement, whose improvement beats the threshold. When nothing passes the
// granularity doubles until every chunk is a single move. Slower than halving
// but able to drop a move at a time.

use super::round::{evaluate_partition, passes, RoundContext, RoundDecision, RoundResult};
use super::types::{CandidateSet, Move, Partition};
use crate::infra::errors::TrimError;
use crate::oracle::{Oracle, OracleSession};

/// `g` contiguous chunks whose sizes differ by at most one.
pub fn split_chunks(moves: &[Move], g: usize) -> Vec<&[Move]> {
    let n = moves.len();
    let g = g.clamp(1, n.max(1));
    let mut chunks = Vec::with_capacity(g);
    let mut start = 0;
    for i in 0..g {
        let end = start + (n - start) / (g - i);
        chunks.push(&moves[start..end]);
        start = end;
    }
    chunks
}

fn complement(moves: &[Move], chunks: &[&[Move]], skip: usize) -> Vec<Move> {
    let mut out = Vec::with_capacity(moves.len());
    for (i, chunk) in chunks.iter().enumerate() {
        if i != skip {
            out.extend_from_slice(chunk);
        }
    }
    out
}

/// One reduction step. `granularity` carries across rounds.
pub async fn run_round<O: Oracle>(
    session: &mut OracleSession<O>,
    current: &CandidateSet,
    granularity: &mut usize,
    ctx: &RoundContext<'_>,
) -> Result<RoundResult, TrimError> {
    let all = current.moves();
    let n = all.len();
    let mut g = (*granularity).clamp(2, n.max(2));
    let mut evaluations = 0;
    let mut failed = 0;
    let mut best: Option<f64> = None;
    let mut attempt = 0;

    loop {
        let chunks = split_chunks(all, g);

        let mut candidates: Vec<(Partition, Vec<Move>)> = chunks
            .iter()
            .enumerate()
            .map(|(i, c)| (Partition::Chunk { index: i, of: g }, c.to_vec()))
            .collect();
        // With two chunks each complement is the other chunk.
        if g > 2 {
            candidates.extend((0..g).map(|i| {
                (
                    Partition::Complement { index: i, of: g },
                    complement(all, &chunks, i),
                )
            }));
        }

        for (partition, subset) in candidates {
            let outcome = evaluate_partition(session, ctx, attempt, partition, &subset).await?;
            attempt += 1;
            evaluations += 1;
            match outcome.improvement {
                None => failed += 1,
                Some(i) => best = Some(best.map_or(i, |b: f64| b.max(i))),
            }
            if passes(&outcome, ctx.min_improvement) {
                *granularity = match partition {
                    Partition::Complement { .. } => (g - 1).max(2),
                    _ => 2,
                };
                tracing::info!(
                    round = ctx.round,
                    partition = %partition,
                    kept = subset.len(),
                    improvement = outcome.score(),
                    "Reduction accepted"
                );
                return Ok(RoundResult {
                    decision: RoundDecision::Shrink {
                        improvement: outcome.score(),
                        kept: CandidateSet::new(subset),
                    },
                    evaluations,
                    failed_evaluations: failed,
                });
            }
        }

        if g >= n {
            *granularity = g;
            return Ok(RoundResult {
                decision: RoundDecision::Keep {
                    best_improvement: best,
                },
                evaluations,
                failed_evaluations: failed,
            });
        }
        g = (g * 2).min(n);
    }
}
