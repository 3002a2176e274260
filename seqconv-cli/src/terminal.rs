// ============================================================================
// seqconv-cli/src/terminal.rs
// ============================================================================
//
// TERMINAL OUTPUT: Progress bar and status lines
//
// KEY COMPONENTS:
// - TerminalReporter: EventHandler that draws an indicatif bar for a session
// - print_section / print_status / print_outcome: styled summary output
//
// The bar is created lazily on the first progress or log event of a session
// and cleared when the terminal event arrives, so rejected requests (which
// only produce a terminal event) never draw one.
//
// AI-ASSISTANT-INFO: Terminal UI for conversions

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use seqconv_core::{ConversionEvent, ConversionOutcome, EventHandler, OutcomeStatus};
use std::sync::Mutex;
use std::time::Duration;

/// Longest engine status line shown next to the bar.
const STATUS_MESSAGE_WIDTH: usize = 72;

pub fn print_section(title: &str) {
    println!("\n{}", title.to_uppercase().bold().cyan());
}

/// Prints an aligned `label: value` line.
pub fn print_status(label: &str, value: &str) {
    let label = format!("{label}:");
    println!("  {:<13} {}", label.bold(), value);
}

/// Prints the final outcome of a session in its status color.
pub fn print_outcome(outcome: &ConversionOutcome) {
    match outcome.status {
        OutcomeStatus::Succeeded => {
            println!("\n  {} {}", "✓".green(), outcome.message.green().bold());
        }
        OutcomeStatus::Cancelled => {
            println!("\n  {} {}", "!".yellow(), outcome.message.yellow().bold());
        }
        OutcomeStatus::Failed => {
            eprintln!("\n  {} {}", "✗".red(), outcome.message.red().bold());
        }
    }
}

/// The last non-empty line of an engine stderr chunk, trimmed to fit.
fn status_line(chunk: &str) -> Option<String> {
    let line = chunk
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()?;
    Some(line.chars().take(STATUS_MESSAGE_WIDTH).collect())
}

/// Renders conversion events as a progress bar on stderr.
pub struct TerminalReporter {
    progress: Mutex<Option<ProgressBar>>,
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self {
            progress: Mutex::new(None),
        }
    }

    fn with_bar(&self, update: impl FnOnce(&ProgressBar)) {
        let Ok(mut guard) = self.progress.lock() else {
            return;
        };
        let bar = guard.get_or_insert_with(|| {
            let bar = ProgressBar::new(100);
            let template = "  ⧖ [{bar:40.cyan/blue}] {percent:>3}% {elapsed_precise} {msg}";
            if let Ok(style) = ProgressStyle::default_bar().template(template) {
                bar.set_style(style.progress_chars("=> "));
            }
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        });
        update(bar);
    }

    fn finish_progress(&self) {
        if let Ok(mut guard) = self.progress.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl EventHandler for TerminalReporter {
    fn handle(&self, event: &ConversionEvent) {
        match event {
            ConversionEvent::Progress { percent } => {
                self.with_bar(|bar| bar.set_position(u64::from(*percent)));
            }
            ConversionEvent::Log { message } => {
                if let Some(line) = status_line(message) {
                    self.with_bar(|bar| bar.set_message(line));
                }
            }
            ConversionEvent::Finished { .. } => self.finish_progress(),
        }
    }
}
