// src/oracle/session.rs — Uniform error semantics over an Oracle
//
// Every evaluation is the strict sequence apply -> measure -> reset. The
// reset runs on every exit path (apply failure, timeout, cancellation), and
// `&mut self` on `evaluate` keeps two applied states from ever overlapping.

use serde::Serialize;
use std::future::Future;
use std::time::Duration;

use super::{cancelled, CancelSignal, Oracle};
use crate::core::types::{Move, OracleCall};
use crate::infra::config::{Aggregation, Config};
use crate::infra::errors::TrimError;

/// Timeouts, repetition and retry knobs for a session.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub discover_timeout: Duration,
    pub apply_timeout: Duration,
    pub measure_timeout: Duration,
    pub reset_timeout: Duration,
    pub repeats: u32,
    pub aggregation: Aggregation,
    pub reset_attempts: u32,
    pub reset_delay: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SessionPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            discover_timeout: config.timeouts.discover(),
            apply_timeout: config.timeouts.apply(),
            measure_timeout: config.timeouts.measure(),
            reset_timeout: config.timeouts.reset(),
            repeats: config.measure.repeats.max(1),
            aggregation: config.measure.aggregation,
            reset_attempts: config.reset.max_attempts.max(1),
            reset_delay: Duration::from_millis(config.reset.retry_delay_ms),
        }
    }
}

/// Outcome of one apply/measure/reset cycle that did not abort the run.
#[derive(Debug)]
pub enum Evaluation {
    Measured(f64),
    /// The subset was untestable (apply failure, timeout, bad reading).
    Failed(TrimError),
}

/// Oracle call counters, reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallStats {
    pub applies: u32,
    pub measurements: u32,
    pub resets: u32,
    pub failed_evaluations: u32,
}

pub struct OracleSession<O> {
    oracle: O,
    policy: SessionPolicy,
    cancel: CancelSignal,
    applied: bool,
    stats: CallStats,
}

impl<O: Oracle> OracleSession<O> {
    pub fn new(oracle: O, policy: SessionPolicy, cancel: CancelSignal) -> Self {
        Self {
            oracle,
            policy,
            cancel,
            applied: false,
            stats: CallStats::default(),
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn stats(&self) -> &CallStats {
        &self.stats
    }

    /// True between an `apply` and its `reset`. Never observable from outside `evaluate`
    /// unless a reset failed for good.
    pub fn is_applied(&self) -> bool {
        self.applied
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Run the discoverer once.
    pub async fn discover(&mut self) -> Result<Vec<Move>, TrimError> {
        let limit = self.policy.discover_timeout;
        self.guarded(OracleCall::Discover, limit, self.oracle.discover())
            .await
    }

    /// Reset unconditionally, e.g. before measuring the baseline.
    pub async fn ensure_pristine(&mut self) -> Result<(), TrimError> {
        self.applied = true;
        self.reset_with_retry().await
    }

    /// Measure the project as it is, without applying anything.
    pub async fn measure_pristine(&mut self) -> Result<f64, TrimError> {
        debug_assert!(!self.applied, "baseline measured on an applied project");
        self.measure_repeated().await
    }

    /// Apply `moves`, measure, and reset. Per-trial failures come back as
    /// `Evaluation::Failed`; only cancellation and unrecoverable reset
    /// failures are returned as errors.
    pub async fn evaluate(&mut self, moves: &[Move]) -> Result<Evaluation, TrimError> {
        // A failed apply may still have touched files, so the state counts as
        // applied from here until a successful reset.
        self.applied = true;
        self.stats.applies += 1;

        let limit = self.policy.apply_timeout;
        let outcome = match self
            .guarded(OracleCall::Apply, limit, self.oracle.apply(moves))
            .await
        {
            Ok(()) => self.measure_repeated().await,
            Err(e) => Err(e),
        };

        self.reset_with_retry().await?;

        match outcome {
            Ok(value) => Ok(Evaluation::Measured(value)),
            Err(e) if e.is_recoverable() => {
                self.stats.failed_evaluations += 1;
                tracing::warn!(moves = moves.len(), "Evaluation failed: {}", e);
                Ok(Evaluation::Failed(e))
            }
            Err(e) => Err(e),
        }
    }

    async fn measure_repeated(&mut self) -> Result<f64, TrimError> {
        let limit = self.policy.measure_timeout;
        let mut readings = Vec::with_capacity(self.policy.repeats as usize);
        for _ in 0..self.policy.repeats {
            self.stats.measurements += 1;
            let value = self
                .guarded(OracleCall::Measure, limit, self.oracle.measure())
                .await?;
            readings.push(value);
        }
        self.policy
            .aggregation
            .aggregate(&readings)
            .ok_or_else(|| TrimError::Measurement("no readings taken".into()))
    }

    /// Bounded retries; a reset that never succeeds poisons every later trial.
    async fn reset_with_retry(&mut self) -> Result<(), TrimError> {
        let max = self.policy.reset_attempts;
        let mut last_error = String::new();

        for attempt in 1..=max {
            self.stats.resets += 1;
            match tokio::time::timeout(self.policy.reset_timeout, self.oracle.reset()).await {
                Ok(Ok(())) => {
                    self.applied = false;
                    if attempt > 1 {
                        tracing::info!(attempt, "Reset succeeded after retry");
                    }
                    return Ok(());
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => {
                    last_error = format!(
                        "reset timed out after {}s",
                        self.policy.reset_timeout.as_secs()
                    )
                }
            }

            tracing::warn!(attempt, max_attempts = max, "Reset failed: {}", last_error);
            if attempt < max {
                tokio::time::sleep(self.policy.reset_delay).await;
            }
        }

        Err(TrimError::Reset {
            attempts: max,
            message: last_error,
        })
    }

    /// Bound `fut` by `limit` and abandon it on cancellation.
    async fn guarded<T>(
        &self,
        call: OracleCall,
        limit: Duration,
        fut: impl Future<Output = Result<T, TrimError>>,
    ) -> Result<T, TrimError> {
        let mut cancel = self.cancel.clone();
        tokio::select! {
            res = tokio::time::timeout(limit, fut) => match res {
                Ok(inner) => inner,
                Err(_) => Err(TrimError::MeasurementTimeout {
                    call,
                    secs: limit.as_secs(),
                }),
            },
            _ = cancelled(&mut cancel) => {
                tracing::warn!(%call, "Cancellation requested; abandoning call");
                Err(TrimError::Cancelled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{cancel_channel, never_cancelled, MockOracle};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn fast_policy() -> SessionPolicy {
        SessionPolicy {
            discover_timeout: Duration::from_secs(5),
            apply_timeout: Duration::from_secs(5),
            measure_timeout: Duration::from_millis(50),
            reset_timeout: Duration::from_secs(5),
            repeats: 1,
            aggregation: Aggregation::Mean,
            reset_attempts: 3,
            reset_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_apply_failure_still_resets() {
        let mut oracle = MockOracle::new();
        oracle.expect_apply().times(1).returning(|_| {
            Err(TrimError::Apply {
                status: Some(1),
                message: "no".into(),
            })
        });
        oracle.expect_measure().times(0);
        oracle.expect_reset().times(1).returning(|| Ok(()));

        let mut session = OracleSession::new(oracle, fast_policy(), never_cancelled());
        let eval = session.evaluate(&[Move::new(1, 1)]).await.unwrap();
        assert!(matches!(eval, Evaluation::Failed(TrimError::Apply { .. })));
        assert!(!session.is_applied());
        assert_eq!(session.stats().failed_evaluations, 1);
    }

    #[tokio::test]
    async fn test_evaluate_measures_and_resets() {
        let mut oracle = MockOracle::new();
        oracle
            .expect_apply()
            .withf(|moves: &[Move]| moves == [Move::new(4, 2)])
            .times(1)
            .returning(|_| Ok(()));
        oracle.expect_measure().times(1).returning(|| Ok(80.0));
        oracle.expect_reset().times(1).returning(|| Ok(()));

        let mut session = OracleSession::new(oracle, fast_policy(), never_cancelled());
        let eval = session.evaluate(&[Move::new(4, 2)]).await.unwrap();
        assert!(matches!(eval, Evaluation::Measured(v) if v == 80.0));
        assert_eq!(
            session.stats(),
            &CallStats {
                applies: 1,
                measurements: 1,
                resets: 1,
                failed_evaluations: 0
            }
        );
    }

    #[tokio::test]
    async fn test_reset_retried_until_success() {
        let mut oracle = MockOracle::new();
        let mut calls = 0;
        oracle.expect_reset().times(3).returning(move || {
            calls += 1;
            if calls < 3 {
                Err(TrimError::Reset {
                    attempts: 1,
                    message: "dirty tree".into(),
                })
            } else {
                Ok(())
            }
        });

        let mut session = OracleSession::new(oracle, fast_policy(), never_cancelled());
        session.ensure_pristine().await.unwrap();
        assert!(!session.is_applied());
    }

    #[tokio::test]
    async fn test_reset_gives_up_after_max_attempts() {
        let mut oracle = MockOracle::new();
        oracle.expect_apply().returning(|_| Ok(()));
        oracle.expect_measure().returning(|| Ok(1.0));
        oracle.expect_reset().times(3).returning(|| {
            Err(TrimError::Reset {
                attempts: 1,
                message: "dirty tree".into(),
            })
        });

        let mut session = OracleSession::new(oracle, fast_policy(), never_cancelled());
        let err = session.evaluate(&[Move::new(1, 1)]).await.unwrap_err();
        assert!(matches!(err, TrimError::Reset { attempts: 3, .. }));
        assert!(session.is_applied());
    }

    #[tokio::test]
    async fn test_repeated_measurements_are_aggregated() {
        let mut oracle = MockOracle::new();
        let mut readings = vec![10.0, 50.0, 12.0].into_iter();
        oracle
            .expect_measure()
            .times(3)
            .returning(move || Ok(readings.next().unwrap()));

        let mut policy = fast_policy();
        policy.repeats = 3;
        policy.aggregation = Aggregation::Median;
        let mut session = OracleSession::new(oracle, policy, never_cancelled());
        assert_eq!(session.measure_pristine().await.unwrap(), 12.0);
    }

    /// Oracle whose benchmark hangs until the test gives up on it.
    struct HangingOracle {
        reset_called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Oracle for HangingOracle {
        async fn discover(&self) -> Result<Vec<Move>, TrimError> {
            Ok(vec![])
        }
        async fn apply(&self, _moves: &[Move]) -> Result<(), TrimError> {
            Ok(())
        }
        async fn measure(&self) -> Result<f64, TrimError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(1.0)
        }
        async fn reset(&self) -> Result<(), TrimError> {
            self.reset_called.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_measure_timeout_is_recoverable_and_resets() {
        let reset_called = Arc::new(AtomicBool::new(false));
        let oracle = HangingOracle {
            reset_called: reset_called.clone(),
        };
        let mut session = OracleSession::new(oracle, fast_policy(), never_cancelled());

        let eval = session.evaluate(&[Move::new(1, 1)]).await.unwrap();
        assert!(matches!(
            eval,
            Evaluation::Failed(TrimError::MeasurementTimeout {
                call: OracleCall::Measure,
                ..
            })
        ));
        assert!(reset_called.load(Ordering::SeqCst));
        assert!(!session.is_applied());
    }

    #[tokio::test]
    async fn test_cancellation_mid_measure_resets_then_errors() {
        let reset_called = Arc::new(AtomicBool::new(false));
        let oracle = HangingOracle {
            reset_called: reset_called.clone(),
        };
        let mut policy = fast_policy();
        policy.measure_timeout = Duration::from_secs(60);
        let (tx, rx) = cancel_channel();
        let mut session = OracleSession::new(oracle, policy, rx);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(true);
        });

        let err = session.evaluate(&[Move::new(1, 1)]).await.unwrap_err();
        assert!(matches!(err, TrimError::Cancelled));
        assert!(reset_called.load(Ordering::SeqCst));
        assert!(!session.is_applied());
    }
}
