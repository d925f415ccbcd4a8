// src/main.rs — move-trimmer entry point

use clap::Parser;

use move_trimmer::cli::Cli;
use move_trimmer::core::types::StopReason;
use move_trimmer::infra::errors::TrimError;
use move_trimmer::infra::logger;

/// Conventional status for a run stopped by SIGINT.
const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() {
    // Initialize logging (respects RUST_LOG)
    logger::init_logging("info");

    let cli = Cli::parse();
    match move_trimmer::cli::run::run_trim(&cli).await {
        Ok(report) if report.stop_reason == StopReason::Cancelled => {
            std::process::exit(EXIT_CANCELLED);
        }
        Ok(_) => {}
        Err(e) => {
            eprintln!("error: {e}");
            let cancelled = matches!(e.downcast_ref::<TrimError>(), Some(TrimError::Cancelled));
            std::process::exit(if cancelled { EXIT_CANCELLED } else { 1 });
        }
    }
}
