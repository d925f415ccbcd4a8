// src/cli/mod.rs — CLI definition (clap derive)

pub mod progress;
pub mod run;

use clap::Parser;
use std::path::PathBuf;

use crate::infra::config::{Config, Strategy};

#[derive(Parser, Debug)]
#[command(
    name = "move-trimmer",
    about = "Trim discovered move opportunities down to the few that matter",
    version
)]
pub struct Cli {
    /// Project build directory (the one holding compile_commands.json)
    pub project: PathBuf,

    /// Config file path (defaults to <project>/move-trimmer.toml, then ~/.move-trimmer/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Stop once at most this many moves remain
    #[arg(short, long)]
    pub target: Option<usize>,

    /// Random splits tried per round
    #[arg(short = 'k', long)]
    pub trials: Option<u32>,

    /// Seed for the shuffles (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Reduction strategy
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Benchmark runs averaged per evaluation
    #[arg(long)]
    pub repeats: Option<u32>,

    /// Improvement a partition must exceed to be kept
    #[arg(long)]
    pub min_improvement: Option<f64>,

    /// Where the candidate set is persisted
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Continue from the persisted candidate set instead of rediscovering
    #[arg(long)]
    pub resume: bool,

    /// Write a JSON report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Suppress progress output (only emit the final move list)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Command-line flags win over the config file.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(target) = self.target {
            config.search.target_size = target;
        }
        if let Some(trials) = self.trials {
            config.search.trials_per_round = trials;
        }
        if let Some(seed) = self.seed {
            config.search.seed = Some(seed);
        }
        if let Some(strategy) = self.strategy {
            config.search.strategy = strategy;
        }
        if let Some(repeats) = self.repeats {
            config.measure.repeats = repeats;
        }
        if let Some(min) = self.min_improvement {
            config.search.min_improvement = min;
        }
        if let Some(ref store) = self.store {
            config.store.path = store.clone();
        }
    }
}
