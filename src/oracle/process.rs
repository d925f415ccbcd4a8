// src/oracle/process.rs — Oracle backed by external commands
//
// The discoverer dumps every feasible move into the selection file; the
// applier applies exactly the moves listed there. Reset is usually a VCS
// restore. The benchmark prints a timing (or is timed as a whole).

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Instant;
use tokio::process::Command;

use super::{pristine, Oracle};
use crate::core::store::MoveStore;
use crate::core::types::Move;
use crate::infra::config::{CommandSpec, Config, MeasureSource};
use crate::infra::errors::TrimError;
use crate::util::{tail_str, truncate_str};

/// Max bytes of child stderr carried into error messages.
const STDERR_EXCERPT: usize = 400;

/// Captured result of one command.
struct CommandOutput {
    success: bool,
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl CommandOutput {
    fn excerpt(&self) -> String {
        let s = self.stderr.trim();
        if s.is_empty() {
            truncate_str(self.stdout.trim(), STDERR_EXCERPT).to_string()
        } else {
            tail_str(s, STDERR_EXCERPT).to_string()
        }
    }
}

pub struct ProcessOracle {
    project: PathBuf,
    selection: MoveStore,
    discover_cmd: CommandSpec,
    apply_cmd: CommandSpec,
    reset_cmd: CommandSpec,
    benchmark_cmd: CommandSpec,
    verify_cmd: Option<CommandSpec>,
    source: MeasureSource,
    checksum_globs: Vec<String>,
    /// Digest of the first verified pristine state; later resets must match it.
    pristine_digest: Mutex<Option<String>>,
}

impl ProcessOracle {
    pub fn from_config(project: impl Into<PathBuf>, config: &Config) -> Result<Self, TrimError> {
        let benchmark_cmd = config
            .tools
            .benchmark
            .clone()
            .ok_or_else(|| TrimError::Setup("no benchmark command configured".into()))?;

        Ok(Self {
            project: project.into(),
            selection: MoveStore::new(config.store.selection_file.clone()),
            discover_cmd: config.tools.discover.clone(),
            apply_cmd: config.tools.apply.clone(),
            reset_cmd: config.tools.reset.clone(),
            benchmark_cmd,
            verify_cmd: config.tools.verify.clone(),
            source: config.measure.source,
            checksum_globs: config.reset.checksum_globs.clone(),
            pristine_digest: Mutex::new(None),
        })
    }

    pub fn project(&self) -> &Path {
        &self.project
    }

    /// Fail early if any configured command cannot be found on PATH.
    pub fn check_commands(&self) -> Result<(), TrimError> {
        let mut specs = vec![
            &self.discover_cmd,
            &self.apply_cmd,
            &self.reset_cmd,
            &self.benchmark_cmd,
        ];
        if let Some(ref verify) = self.verify_cmd {
            specs.push(verify);
        }
        for spec in specs {
            let command = self.substitute(&spec.command);
            if which::which(&command).is_err() && !Path::new(&command).is_file() {
                return Err(TrimError::Setup(format!("command not found: {command}")));
            }
        }
        Ok(())
    }

    fn substitute(&self, template: &str) -> String {
        template
            .replace("{project}", &self.project.to_string_lossy())
            .replace("{moves}", &self.selection.path().to_string_lossy())
    }

    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, TrimError> {
        let program = self.substitute(&spec.command);
        let args: Vec<String> = spec.args.iter().map(|a| self.substitute(a)).collect();
        tracing::debug!("Running: {} {}", program, args.join(" "));

        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (k, v) in &spec.env {
            cmd.env(k, self.substitute(v));
        }

        let output = cmd.output().await?;
        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run the optional verify command and checksum comparison after a reset.
    async fn verify_pristine(&self) -> Result<(), TrimError> {
        if let Some(ref verify) = self.verify_cmd {
            let out = self.run(verify).await?;
            if !out.success {
                return Err(TrimError::Reset {
                    attempts: 1,
                    message: format!("verify command reported changes: {}", out.excerpt()),
                });
            }
        }

        if self.checksum_globs.is_empty() {
            return Ok(());
        }
        let digest = pristine::checksum(&self.project, &self.checksum_globs)?;
        let mut guard = self
            .pristine_digest
            .lock()
            .map_err(|_| anyhow::anyhow!("pristine digest lock poisoned"))?;
        match guard.as_deref() {
            None => {
                tracing::debug!(digest = %digest, "Captured pristine checksum");
                *guard = Some(digest);
                Ok(())
            }
            Some(expected) if expected == digest => Ok(()),
            Some(expected) => Err(TrimError::Reset {
                attempts: 1,
                message: format!("checksum {digest} differs from pristine {expected}"),
            }),
        }
    }
}

#[async_trait]
impl Oracle for ProcessOracle {
    async fn discover(&self) -> Result<Vec<Move>, TrimError> {
        // A stale list from an earlier run must not pass for fresh output.
        if self.selection.exists() {
            std::fs::remove_file(self.selection.path())?;
        }

        let out = self.run(&self.discover_cmd).await?;
        if !out.success {
            return Err(TrimError::Discovery(format!(
                "exit {:?}: {}",
                out.code,
                out.excerpt()
            )));
        }
        if !self.selection.exists() {
            return Err(TrimError::Discovery(format!(
                "discoverer did not write {}",
                self.selection.path().display()
            )));
        }
        Ok(self.selection.load()?.into_vec())
    }

    async fn apply(&self, moves: &[Move]) -> Result<(), TrimError> {
        self.selection.save(moves)?;
        let out = self.run(&self.apply_cmd).await?;
        if out.success {
            Ok(())
        } else {
            Err(TrimError::Apply {
                status: out.code,
                message: out.excerpt(),
            })
        }
    }

    async fn measure(&self) -> Result<f64, TrimError> {
        let started = Instant::now();
        let out = self.run(&self.benchmark_cmd).await?;
        let elapsed = started.elapsed();
        if !out.success {
            return Err(TrimError::Measurement(format!(
                "benchmark exit {:?}: {}",
                out.code,
                out.excerpt()
            )));
        }
        match self.source {
            MeasureSource::WallClock => Ok(elapsed.as_secs_f64()),
            MeasureSource::Stdout => parse_reading(&out.stdout).ok_or_else(|| {
                TrimError::Measurement(format!(
                    "no numeric reading in benchmark output: {:?}",
                    truncate_str(out.stdout.trim(), STDERR_EXCERPT)
                ))
            }),
        }
    }

    async fn reset(&self) -> Result<(), TrimError> {
        let out = self.run(&self.reset_cmd).await?;
        if !out.success {
            return Err(TrimError::Reset {
                attempts: 1,
                message: format!("exit {:?}: {}", out.code, out.excerpt()),
            });
        }
        self.verify_pristine().await
    }
}

/// The last token on stdout that parses as a finite number.
pub fn parse_reading(stdout: &str) -> Option<f64> {
    stdout
        .split_whitespace()
        .rev()
        .filter_map(|tok| {
            tok.trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == ',' || c == ';')
                .parse::<f64>()
                .ok()
        })
        .find(|v| v.is_finite())
}
