// src/cli/run.rs — Default command: trim a project's move set

use crate::core::report::TrimReport;
use crate::core::search::Trimmer;
use crate::core::store::MoveStore;
use crate::core::types::CandidateSet;
use crate::infra::config::Config;
use crate::infra::errors::TrimError;
use crate::oracle::session::SessionPolicy;
use crate::oracle::{cancel_channel, Oracle, OracleSession, ProcessOracle};

use super::Cli;

type CancelSender = tokio::sync::watch::Sender<bool>;

/// Status for a forced exit on a repeated interrupt.
const EXIT_ABORTED: i32 = 130;

/// Resolve config for the invocation: explicit file, else project/user lookup.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load(&cli.project)?,
    };
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

/// Starting set: the persisted one on `--resume`, otherwise a fresh discovery
/// which is persisted before any trimming.
pub async fn initial_candidates<O: Oracle>(
    session: &mut OracleSession<O>,
    store: &MoveStore,
    resume: bool,
) -> Result<CandidateSet, TrimError> {
    if resume && store.exists() {
        let set = store.load()?;
        tracing::info!(
            path = %store.path().display(),
            moves = set.len(),
            "Resuming from persisted move list"
        );
        return Ok(set);
    }
    if resume {
        tracing::warn!(
            path = %store.path().display(),
            "No persisted move list; discovering from scratch"
        );
    }

    let moves = session.discover().await.map_err(|e| match e {
        TrimError::Cancelled | TrimError::Discovery(_) | TrimError::CorruptStore { .. } => e,
        other => TrimError::Discovery(other.to_string()),
    })?;
    let set = CandidateSet::new(moves);
    store.save(set.moves())?;
    tracing::info!(moves = set.len(), "Discovered move opportunities");
    Ok(set)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterruptAction {
    /// Ask the session to stop once the project is reset.
    Cancel,
    /// Exit at once, leaving the project as it is.
    Abort,
}

/// First interrupt raises the cancel flag; any later one aborts.
fn on_interrupt(count: u32, cancel_tx: &CancelSender) -> InterruptAction {
    if count <= 1 {
        let _ = cancel_tx.send(true);
        InterruptAction::Cancel
    } else {
        InterruptAction::Abort
    }
}

async fn watch_interrupts(cancel_tx: CancelSender) {
    let mut count = 0u32;
    while tokio::signal::ctrl_c().await.is_ok() {
        count += 1;
        match on_interrupt(count, &cancel_tx) {
            InterruptAction::Cancel => tracing::warn!(
                "Interrupt received; stopping after the project is reset (Ctrl-C again to abort)"
            ),
            InterruptAction::Abort => {
                tracing::error!("Second interrupt; exiting without restoring the project");
                std::process::exit(EXIT_ABORTED);
            }
        }
    }
}

/// Trim the project named on the command line and print the surviving moves.
pub async fn run_trim(cli: &Cli) -> anyhow::Result<TrimReport> {
    let config = load_config(cli)?;

    let oracle = ProcessOracle::from_config(&cli.project, &config)?;
    oracle.check_commands()?;

    let (cancel_tx, cancel_rx) = cancel_channel();
    tokio::spawn(watch_interrupts(cancel_tx));

    let mut session = OracleSession::new(oracle, SessionPolicy::from_config(&config), cancel_rx);
    let store = MoveStore::new(config.store.path.clone());

    if config.reset.on_start {
        session.ensure_pristine().await?;
    }
    let initial = initial_candidates(&mut session, &store, cli.resume).await?;

    let mut trimmer = Trimmer::new(session, config.search.clone(), store);
    if !cli.quiet {
        trimmer = trimmer.with_progress(super::progress::terminal_progress());
    }
    let report = trimmer.run(initial).await?;

    if !cli.quiet {
        eprint!("{}", report.render_text());
    }
    if let Some(ref path) = cli.report {
        report.write_json(path)?;
        tracing::info!(path = %path.display(), "Report written");
    }
    print!("{}", report.moves_listing());

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Move;
    use crate::oracle::{never_cancelled, MockOracle};
    use clap::Parser;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_resume_uses_persisted_list() {
        let dir = TempDir::new().unwrap();
        let store = MoveStore::new(dir.path().join("moves.tmp"));
        store.save(&[Move::new(2, 2), Move::new(1, 1)]).unwrap();

        let mut oracle = MockOracle::new();
        oracle.expect_discover().times(0);
        let mut session = OracleSession::new(oracle, SessionPolicy::default(), never_cancelled());

        let set = initial_candidates(&mut session, &store, true).await.unwrap();
        assert_eq!(set.moves(), &[Move::new(1, 1), Move::new(2, 2)]);
    }

    #[tokio::test]
    async fn test_fresh_run_discovers_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = MoveStore::new(dir.path().join("moves.tmp"));
        store.save(&[Move::new(99, 99)]).unwrap();

        let mut oracle = MockOracle::new();
        oracle
            .expect_discover()
            .times(1)
            .returning(|| Ok(vec![Move::new(5, 1), Move::new(3, 2), Move::new(5, 1)]));
        let mut session = OracleSession::new(oracle, SessionPolicy::default(), never_cancelled());

        let set = initial_candidates(&mut session, &store, false).await.unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(store.load().unwrap(), set);
    }

    #[tokio::test]
    async fn test_corrupt_store_on_resume_is_setup_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("moves.tmp");
        std::fs::write(&path, "1 1\nnot a move\n").unwrap();
        let store = MoveStore::new(path);

        let mut session =
            OracleSession::new(MockOracle::new(), SessionPolicy::default(), never_cancelled());
        let err = initial_candidates(&mut session, &store, true)
            .await
            .unwrap_err();
        assert!(err.is_setup());
    }

    #[tokio::test]
    async fn test_discovery_failure_is_setup_error() {
        let dir = TempDir::new().unwrap();
        let store = MoveStore::new(dir.path().join("moves.tmp"));
        let mut oracle = MockOracle::new();
        oracle
            .expect_discover()
            .returning(|| Err(TrimError::Measurement("tool crashed".into())));
        let mut session = OracleSession::new(oracle, SessionPolicy::default(), never_cancelled());

        let err = initial_candidates(&mut session, &store, false)
            .await
            .unwrap_err();
        assert!(matches!(err, TrimError::Discovery(_)));
        assert!(!store.exists());
    }

    #[test]
    fn test_second_interrupt_aborts() {
        let (tx, rx) = cancel_channel();
        assert_eq!(on_interrupt(1, &tx), InterruptAction::Cancel);
        assert!(*rx.borrow());
        assert_eq!(on_interrupt(2, &tx), InterruptAction::Abort);
        assert_eq!(on_interrupt(3, &tx), InterruptAction::Abort);
    }

    #[test]
    fn test_load_config_rejects_store_over_selection_file() {
        let dir = TempDir::new().unwrap();
        let cfg = dir.path().join("cfg.toml");
        let selection = dir.path().join("selected.txt");
        std::fs::write(
            &cfg,
            format!(
                "[store]\nselection_file = {:?}\n\n[tools.benchmark]\ncommand = \"./bench.sh\"\n",
                selection.to_str().unwrap()
            ),
        )
        .unwrap();
        let cli = Cli::try_parse_from([
            "move-trimmer",
            dir.path().to_str().unwrap(),
            "--config",
            cfg.to_str().unwrap(),
            "--store",
            selection.to_str().unwrap(),
        ])
        .unwrap();
        let err = load_config(&cli).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrimError>(),
            Some(TrimError::Config(_))
        ));
    }

    #[test]
    fn test_load_config_rejects_missing_benchmark() {
        let dir = TempDir::new().unwrap();
        let cfg = dir.path().join("cfg.toml");
        std::fs::write(&cfg, "").unwrap();
        let cli = Cli::try_parse_from([
            "move-trimmer",
            dir.path().to_str().unwrap(),
            "--config",
            cfg.to_str().unwrap(),
        ])
        .unwrap();
        assert!(load_config(&cli).is_err());
    }
}
