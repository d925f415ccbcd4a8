// src/oracle/mod.rs — External collaborators behind one trait
//
// `Oracle` is the raw capability set (discover, apply, measure, reset).
// `OracleSession` wraps any oracle with timeouts, cancellation, repeated
// measurement and bounded reset retries.

pub mod pristine;
pub mod process;
pub mod session;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::core::types::Move;
use crate::infra::errors::TrimError;

pub use process::ProcessOracle;
pub use session::{Evaluation, OracleSession};

/// The discoverer, applier, resetter and benchmark of one project checkout.
///
/// Implementations assume a single shared checkout: callers must never
/// `apply` twice without a `reset` in between.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Every move opportunity in the pristine project.
    async fn discover(&self) -> Result<Vec<Move>, TrimError>;

    /// Rewrite the project so exactly `moves` are applied.
    async fn apply(&self, moves: &[Move]) -> Result<(), TrimError>;

    /// One benchmark reading of the project's current state. Lower is better.
    async fn measure(&self) -> Result<f64, TrimError>;

    /// Return the project to its pristine state.
    async fn reset(&self) -> Result<(), TrimError>;
}

/// Receiver side of the operator-abort flag.
pub type CancelSignal = watch::Receiver<bool>;

/// Create a cancel flag. Send `true` to request cancellation.
pub fn cancel_channel() -> (watch::Sender<bool>, CancelSignal) {
    watch::channel(false)
}

/// A signal that never fires; its sender is dropped immediately.
pub fn never_cancelled() -> CancelSignal {
    let (_tx, rx) = watch::channel(false);
    rx
}

/// Resolve once cancellation has been requested. Pends forever if the sender is gone.
pub async fn cancelled(signal: &mut CancelSignal) {
    loop {
        if *signal.borrow_and_update() {
            return;
        }
        if signal.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
