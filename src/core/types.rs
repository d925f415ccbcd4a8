// src/core/types.rs — Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A move opportunity, identified by its position in the pristine source.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Move {
    pub line: u32,
    pub column: u32,
}

impl Move {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The moves still believed to be jointly beneficial.
///
/// Kept sorted and free of duplicates so that a seeded shuffle of the same set
/// always starts from the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSet {
    moves: Vec<Move>,
}

impl CandidateSet {
    pub fn new(moves: impl IntoIterator<Item = Move>) -> Self {
        let mut moves: Vec<Move> = moves.into_iter().collect();
        moves.sort_unstable();
        moves.dedup();
        Self { moves }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn contains(&self, m: &Move) -> bool {
        self.moves.binary_search(m).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Move> {
        self.moves.iter()
    }

    pub fn into_vec(self) -> Vec<Move> {
        self.moves
    }
}

impl FromIterator<Move> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// One of the four calls made against the external collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleCall {
    Discover,
    Apply,
    Measure,
    Reset,
}

impl fmt::Display for OracleCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleCall::Discover => write!(f, "discover"),
            OracleCall::Apply => write!(f, "apply"),
            OracleCall::Measure => write!(f, "measure"),
            OracleCall::Reset => write!(f, "reset"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Half {
    Left,
    Right,
}

impl fmt::Display for Half {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Half::Left => write!(f, "left"),
            Half::Right => write!(f, "right"),
        }
    }
}

/// Which slice of the current set an evaluation covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    Half(Half),
    /// Chunk `index` of `of` equal slices.
    Chunk { index: usize, of: usize },
    /// Everything except chunk `index` of `of`.
    Complement { index: usize, of: usize },
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Half(h) => write!(f, "{h}"),
            Partition::Chunk { index, of } => write!(f, "chunk {}/{}", index + 1, of),
            Partition::Complement { index, of } => {
                write!(f, "complement {}/{}", index + 1, of)
            }
        }
    }
}

/// One evaluated partition. Never persisted.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub trial: u32,
    pub partition: Partition,
    pub moves: Vec<Move>,
    pub measured: Option<f64>,
    /// `baseline - measured`; `None` when the half could not be evaluated.
    pub improvement: Option<f64>,
    pub error: Option<String>,
}

impl TrialOutcome {
    /// Improvement used for selection. Failed halves rank below everything.
    pub fn score(&self) -> f64 {
        self.improvement.unwrap_or(f64::NEG_INFINITY)
    }
}

/// Controller state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    Init,
    MeasuringBaseline,
    RoundStart,
    Trialing,
    RoundDecide,
    Done,
}

impl fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchPhase::Init => "init",
            SearchPhase::MeasuringBaseline => "measuring_baseline",
            SearchPhase::RoundStart => "round_start",
            SearchPhase::Trialing => "trialing",
            SearchPhase::RoundDecide => "round_decide",
            SearchPhase::Done => "done",
        };
        write!(f, "{s}")
    }
}

/// Why the controller stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The set is at or below the target size.
    Trimmed,
    /// No partition improved on the baseline.
    NoImprovement,
    /// Operator abort; the store holds the last completed round.
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Trimmed => write!(f, "trimmed"),
            StopReason::NoImprovement => write!(f, "no further improvement"),
            StopReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Record of one accepted or rejected round, kept for the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: u32,
    pub size_before: usize,
    pub size_after: usize,
    /// Best improvement seen in the round (accepted or not).
    pub best_improvement: Option<f64>,
    pub evaluations: u32,
    pub failed_evaluations: u32,
    pub accepted: bool,
}

/// Lifecycle notifications for progress rendering.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    BaselineMeasured {
        baseline: f64,
        candidates: usize,
    },
    RoundStart {
        round: u32,
        size: usize,
    },
    Evaluated {
        round: u32,
        trial: u32,
        partition: Partition,
        size: usize,
        improvement: Option<f64>,
    },
    RoundEnd {
        round: u32,
        kept: usize,
        improvement: Option<f64>,
        accepted: bool,
    },
    Done {
        reason: StopReason,
        final_size: usize,
    },
}
