// src/core/search.rs — Trimming controller
//
// INIT -> MEASURING_BASELINE -> ROUND_START -> TRIALING -> ROUND_DECIDE
//      -> (ROUND_START | DONE)
//
// The baseline is measured once and held for the whole run. Each accepted
// round replaces the candidate set wholesale and persists it before the next
// round starts, so the store only ever reflects completed rounds.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::report::TrimReport;
use super::round::{RoundContext, RoundDecision};
use super::store::MoveStore;
use super::types::*;
use super::{ddmin, halving};
use crate::infra::config::{SearchConfig, Strategy};
use crate::infra::errors::TrimError;
use crate::oracle::{Oracle, OracleSession};

pub struct Trimmer<O> {
    session: OracleSession<O>,
    config: SearchConfig,
    store: MoveStore,
    rng: StdRng,
    phase: SearchPhase,
    /// Carried between delta-debugging rounds.
    granularity: usize,
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send>>,
}

impl<O: Oracle> Trimmer<O> {
    pub fn new(session: OracleSession<O>, config: SearchConfig, store: MoveStore) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            session,
            config,
            store,
            rng,
            phase: SearchPhase::Init,
            granularity: 2,
            on_progress: None,
        }
    }

    /// Set a callback for real-time progress events.
    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn session(&self) -> &OracleSession<O> {
        &self.session
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    /// Trim `initial` until it fits the target or stops improving.
    ///
    /// The project is expected to be pristine on entry and is pristine on every
    /// return, error or not, unless a reset failed for good.
    pub async fn run(&mut self, initial: CandidateSet) -> Result<TrimReport, TrimError> {
        let started_at = Utc::now();
        let initial_size = initial.len();
        self.phase = SearchPhase::MeasuringBaseline;

        let baseline = match self.session.measure_pristine().await {
            Ok(v) => v,
            Err(TrimError::Cancelled) => {
                return Ok(self.finish(
                    started_at,
                    None,
                    initial_size,
                    initial,
                    vec![],
                    StopReason::Cancelled,
                ));
            }
            Err(e) => {
                return Err(TrimError::Setup(format!(
                    "baseline measurement failed: {e}"
                )))
            }
        };
        tracing::info!(baseline, candidates = initial_size, "Baseline measured");
        self.emit(ProgressEvent::BaselineMeasured {
            baseline,
            candidates: initial_size,
        });

        let mut current = initial;
        let mut rounds: Vec<RoundSummary> = Vec::new();

        let reason = loop {
            self.phase = SearchPhase::RoundStart;
            if current.len() <= self.config.target_size {
                break StopReason::Trimmed;
            }
            if self.session.is_cancelled() {
                break StopReason::Cancelled;
            }

            let round = rounds.len() as u32 + 1;
            tracing::info!(round, size = current.len(), "Round started");
            self.emit(ProgressEvent::RoundStart {
                round,
                size: current.len(),
            });

            self.phase = SearchPhase::Trialing;
            let result = {
                let on_progress = &self.on_progress;
                let emit = |event: ProgressEvent| {
                    if let Some(cb) = on_progress {
                        cb(event);
                    }
                };
                let ctx = RoundContext {
                    round,
                    baseline,
                    min_improvement: self.config.min_improvement,
                    emit: &emit,
                };
                match self.config.strategy {
                    Strategy::Halving => {
                        halving::run_round(
                            &mut self.session,
                            &mut self.rng,
                            &current,
                            self.config.trials_per_round,
                            &ctx,
                        )
                        .await
                    }
                    Strategy::Delta => {
                        ddmin::run_round(&mut self.session, &current, &mut self.granularity, &ctx)
                            .await
                    }
                }
            };
            let result = match result {
                Ok(r) => r,
                Err(TrimError::Cancelled) => break StopReason::Cancelled,
                Err(e) => return Err(e),
            };

            self.phase = SearchPhase::RoundDecide;
            let size_before = current.len();
            match result.decision {
                RoundDecision::Shrink { kept, improvement } => {
                    self.store.save(kept.moves())?;
                    rounds.push(RoundSummary {
                        round,
                        size_before,
                        size_after: kept.len(),
                        best_improvement: Some(improvement),
                        evaluations: result.evaluations,
                        failed_evaluations: result.failed_evaluations,
                        accepted: true,
                    });
                    self.emit(ProgressEvent::RoundEnd {
                        round,
                        kept: kept.len(),
                        improvement: Some(improvement),
                        accepted: true,
                    });
                    current = kept;
                }
                RoundDecision::Keep { best_improvement } => {
                    rounds.push(RoundSummary {
                        round,
                        size_before,
                        size_after: size_before,
                        best_improvement,
                        evaluations: result.evaluations,
                        failed_evaluations: result.failed_evaluations,
                        accepted: false,
                    });
                    self.emit(ProgressEvent::RoundEnd {
                        round,
                        kept: size_before,
                        improvement: best_improvement,
                        accepted: false,
                    });
                    break StopReason::NoImprovement;
                }
            }
        };

        Ok(self.finish(started_at, Some(baseline), initial_size, current, rounds, reason))
    }

    fn finish(
        &mut self,
        started_at: chrono::DateTime<Utc>,
        baseline: Option<f64>,
        initial_size: usize,
        final_set: CandidateSet,
        rounds: Vec<RoundSummary>,
        reason: StopReason,
    ) -> TrimReport {
        self.phase = SearchPhase::Done;
        tracing::info!(reason = %reason, final_size = final_set.len(), "Trimming stopped");
        self.emit(ProgressEvent::Done {
            reason,
            final_size: final_set.len(),
        });

        TrimReport {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at,
            finished_at: Utc::now(),
            strategy: self.config.strategy,
            seed: self.config.seed,
            target_size: self.config.target_size,
            baseline,
            initial_size,
            final_size: final_set.len(),
            stop_reason: reason,
            last_improvement: rounds.last().and_then(|r| r.best_improvement),
            rounds,
            oracle_calls: self.session.stats().clone(),
            final_moves: final_set.into_vec(),
        }
    }
}
