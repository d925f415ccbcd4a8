// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::infra::errors::TrimError;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub measure: MeasureConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub reset: ResetConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

/// How candidate sets are reduced round by round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Randomized halving with repeated trials per round.
    #[default]
    Halving,
    /// Chunk/complement reduction with growing granularity (slower, finer).
    Delta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub target_size: usize,
    pub trials_per_round: u32,
    pub min_improvement: f64,
    pub seed: Option<u64>,
    pub strategy: Strategy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            target_size: 10,
            trials_per_round: 3,
            min_improvement: 0.0,
            seed: None,
            strategy: Strategy::Halving,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    Mean,
    Median,
}

impl Aggregation {
    /// Collapse repeated readings into one value. `None` for no readings.
    pub fn aggregate(&self, readings: &[f64]) -> Option<f64> {
        if readings.is_empty() {
            return None;
        }
        match self {
            Aggregation::Mean => Some(readings.iter().sum::<f64>() / readings.len() as f64),
            Aggregation::Median => {
                let mut sorted = readings.to_vec();
                sorted.sort_by(|a, b| a.total_cmp(b));
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    Some((sorted[mid - 1] + sorted[mid]) / 2.0)
                } else {
                    Some(sorted[mid])
                }
            }
        }
    }
}

/// Where the benchmark's scalar reading comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureSource {
    /// Last numeric token printed on stdout.
    #[default]
    Stdout,
    /// Wall-clock seconds spent in the benchmark command.
    WallClock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    pub repeats: u32,
    pub aggregation: Aggregation,
    pub source: MeasureSource,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            repeats: 1,
            aggregation: Aggregation::Mean,
            source: MeasureSource::Stdout,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub discover_secs: u64,
    pub apply_secs: u64,
    pub measure_secs: u64,
    pub reset_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            discover_secs: 3600,
            apply_secs: 1800,
            measure_secs: 1800,
            reset_secs: 300,
        }
    }
}

impl TimeoutConfig {
    pub fn discover(&self) -> Duration {
        Duration::from_secs(self.discover_secs)
    }

    pub fn apply(&self) -> Duration {
        Duration::from_secs(self.apply_secs)
    }

    pub fn measure(&self) -> Duration {
        Duration::from_secs(self.measure_secs)
    }

    pub fn reset(&self) -> Duration {
        Duration::from_secs(self.reset_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    /// Reset once before measuring the baseline.
    pub on_start: bool,
    /// Files hashed to prove a reset restored the pristine tree. Empty disables the check.
    pub checksum_globs: Vec<String>,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 1_000,
            on_start: true,
            checksum_globs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Persisted candidate set, one `line column` pair per line.
    pub path: PathBuf,
    /// File handed to the discoverer and applier through `{moves}`.
    pub selection_file: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("moves.tmp"),
            selection_file: PathBuf::from("moves.selected"),
        }
    }
}

/// An external command. `{project}` and `{moves}` are substituted in args and env values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>, args: &[&str]) -> Self {
        Self {
            command: command.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            env: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub discover: CommandSpec,
    pub apply: CommandSpec,
    pub reset: CommandSpec,
    #[serde(default)]
    pub benchmark: Option<CommandSpec>,
    /// Extra pristine check run after every reset; must exit 0.
    #[serde(default)]
    pub verify: Option<CommandSpec>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            discover: CommandSpec::new(
                "run-clang-tidy.py",
                &[
                    "-p",
                    "{project}",
                    "-checks=-*,performance-missing-moves",
                    "-quiet",
                ],
            ),
            apply: CommandSpec::new(
                "run-clang-tidy.py",
                &[
                    "-fix",
                    "-p",
                    "{project}",
                    "-checks=-*,performance-missing-moves",
                    "-quiet",
                ],
            ),
            reset: CommandSpec::new("git", &["-C", "{project}", "checkout", "--", "."]),
            benchmark: None,
            verify: None,
        }
    }
}

impl Config {
    /// Load config for `project`: the project file if present, then the user file,
    /// falling back to defaults.
    pub fn load(project: &Path) -> anyhow::Result<Self> {
        let project_file = paths::project_config_path(project);
        if project_file.exists() {
            return Self::load_from(&project_file);
        }
        match paths::config_file_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject settings the search cannot run with.
    pub fn validate(&self) -> Result<(), TrimError> {
        if self.search.target_size == 0 {
            return Err(TrimError::Config("search.target_size must be at least 1".into()));
        }
        if self.search.trials_per_round == 0 {
            return Err(TrimError::Config(
                "search.trials_per_round must be at least 1".into(),
            ));
        }
        if !self.search.min_improvement.is_finite() {
            return Err(TrimError::Config("search.min_improvement must be finite".into()));
        }
        if self.measure.repeats == 0 {
            return Err(TrimError::Config("measure.repeats must be at least 1".into()));
        }
        if self.reset.max_attempts == 0 {
            return Err(TrimError::Config("reset.max_attempts must be at least 1".into()));
        }
        // The applier rewrites the selection file for every trial half.
        if resolve_path(&self.store.path) == resolve_path(&self.store.selection_file) {
            return Err(TrimError::Config(format!(
                "store.selection_file must differ from store.path ({})",
                self.store.path.display()
            )));
        }
        if self.tools.benchmark.is_none() {
            return Err(TrimError::Setup(
                "no benchmark command configured ([tools.benchmark])".into(),
            ));
        }
        Ok(())
    }
}

/// Canonical form of `path`, resolving through the parent when the file does not exist yet.
fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(p) = path.canonicalize() {
        return p;
    }
    match (path.parent(), path.file_name()) {
        (Some(dir), Some(name)) => {
            let dir = if dir.as_os_str().is_empty() {
                Path::new(".")
            } else {
                dir
            };
            dir.canonicalize()
                .map(|d| d.join(name))
                .unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}
