// src/cli/progress.rs — Terminal progress renderer

use crate::core::types::ProgressEvent;

/// One line per event, formatted for stderr.
pub fn format_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::BaselineMeasured {
            baseline,
            candidates,
        } => format!("[baseline] {baseline:.4} with {candidates} candidate move(s)"),
        ProgressEvent::RoundStart { round, size } => {
            format!("[round {round}] trimming {size} move(s)")
        }
        ProgressEvent::Evaluated {
            round,
            trial,
            partition,
            size,
            improvement,
        } => {
            let label = partition.to_string();
            match improvement {
                Some(i) => format!(
                    "[round {round}]   trial {} {label:<14} {size:>5} move(s)  improvement {i:+.4}",
                    trial + 1
                ),
                None => format!(
                    "[round {round}]   trial {} {label:<14} {size:>5} move(s)  failed",
                    trial + 1
                ),
            }
        }
        ProgressEvent::RoundEnd {
            round,
            kept,
            improvement,
            accepted,
        } => {
            let best = improvement
                .map(|i| format!("{i:+.4}"))
                .unwrap_or_else(|| "none".into());
            if *accepted {
                format!("[round {round}] kept {kept} move(s), improvement {best}")
            } else {
                format!("[round {round}] no improving partition (best {best})")
            }
        }
        ProgressEvent::Done { reason, final_size } => {
            format!("[done] {reason}, {final_size} move(s) left")
        }
    }
}

/// Build a progress callback that writes formatted output to stderr.
///
/// Returns a closure suitable for `Trimmer::with_progress()`.
pub fn terminal_progress() -> impl Fn(ProgressEvent) + Send + 'static {
    move |event| eprintln!("{}", format_event(&event))
}
