//! Terminal output: a spinner while webhooks are delivered and coloured
//! summaries of a process.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::process::{Process, State};

/// Spinner shown while an operation waits on webhook delivery.
pub struct DeliveryProgress {
    pb: ProgressBar,
}

impl DeliveryProgress {
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { pb }
    }

    pub fn finish(self) {
        self.pb.finish_and_clear();
    }
}

fn state_style(state: State) -> Style {
    match state {
        State::Scheduled => Style::new().dim(),
        State::Processing | State::PostProcessing => Style::new().yellow(),
        State::Ended => Style::new().green().bold(),
    }
}

/// One-line summary: id, state and counters.
pub fn summary_line(process: &Process) -> String {
    let expected = match process.initialization() {
        Some(init) => init
            .expected
            .map_or_else(|| "?".to_string(), |n| n.to_string()),
        None => "-".to_string(),
    };
    format!(
        "{} [{}] handled {} · skipped {} · failed {} / {}",
        process.id(),
        state_style(process.state()).apply_to(process.state()),
        process.handled_count(),
        process.skipped_count(),
        process.failed_count(),
        expected,
    )
}

pub fn print_summary(process: &Process) {
    println!("  {}", summary_line(process));
}

pub fn print_failure(message: &str) {
    eprintln!("  {} {message}", Style::new().red().bold().apply_to("✗"));
}

/// Prints the JSON snapshot of a process.
pub fn print_snapshot(process: &Process) {
    println!(
        "{}",
        serde_json::to_string_pretty(&process.snapshot()).unwrap_or_default()
    );
}
