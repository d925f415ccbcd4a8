// src/infra/errors.rs — Error types for move-trimmer

use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::OracleCall;

#[derive(Error, Debug)]
pub enum TrimError {
    // Setup errors (fatal, before any trimming)
    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Move discovery failed: {0}")]
    Discovery(String),

    #[error("Corrupt move list {}:{line}: {content:?}", path.display())]
    CorruptStore {
        path: PathBuf,
        line: usize,
        content: String,
    },

    // Per-trial errors (recoverable, the half is never selected)
    #[error("Applier exited with {}: {message}", status.map(|s| s.to_string()).unwrap_or_else(|| "signal".into()))]
    Apply {
        status: Option<i32>,
        message: String,
    },

    #[error("{call} timed out after {secs}s")]
    MeasurementTimeout { call: OracleCall, secs: u64 },

    #[error("Measurement failed: {0}")]
    Measurement(String),

    // Fatal once retries are exhausted
    #[error("Reset failed after {attempts} attempt(s): {message}")]
    Reset { attempts: u32, message: String },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrimError {
    /// Errors that only disqualify the half being evaluated.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TrimError::Apply { .. }
                | TrimError::MeasurementTimeout { .. }
                | TrimError::Measurement(_)
        )
    }

    /// Whether the error happened before trimming could start.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            TrimError::Setup(_)
                | TrimError::Discovery(_)
                | TrimError::CorruptStore { .. }
                | TrimError::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(TrimError::Apply {
            status: Some(1),
            message: "boom".into()
        }
        .is_recoverable());
        assert!(TrimError::MeasurementTimeout {
            call: OracleCall::Measure,
            secs: 5
        }
        .is_recoverable());
        assert!(TrimError::Measurement("no number".into()).is_recoverable());
        assert!(!TrimError::Reset {
            attempts: 3,
            message: "dirty".into()
        }
        .is_recoverable());
        assert!(!TrimError::Cancelled.is_recoverable());
    }

    #[test]
    fn test_setup_classification() {
        assert!(TrimError::Discovery("exit 2".into()).is_setup());
        assert!(TrimError::CorruptStore {
            path: "moves.tmp".into(),
            line: 3,
            content: "x y".into()
        }
        .is_setup());
        assert!(!TrimError::Cancelled.is_setup());
    }

    #[test]
    fn test_display_messages() {
        let e = TrimError::Apply {
            status: None,
            message: "killed".into(),
        };
        assert_eq!(e.to_string(), "Applier exited with signal: killed");

        let e = TrimError::MeasurementTimeout {
            call: OracleCall::Apply,
            secs: 30,
        };
        assert_eq!(e.to_string(), "apply timed out after 30s");

        let e = TrimError::CorruptStore {
            path: "moves.tmp".into(),
            line: 2,
            content: "12".into(),
        };
        assert_eq!(e.to_string(), "Corrupt move list moves.tmp:2: \"12\"");
    }
}
