//! Spinner for one-shot builds.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

/// Spinner shown while pipelines run.
///
/// Hidden automatically when stderr is not a terminal.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    /// Create and start a new spinner.
    pub fn new(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_strings(&["◐", "◓", "◑", "◒", "●"]));
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Finish with a green checkmark.
    pub fn finish(&self, message: &str) {
        self.pb
            .finish_with_message(format!("{} {}", "✓".green(), message));
    }

    /// Finish with a red cross.
    pub fn fail(&self, message: &str) {
        self.pb
            .finish_with_message(format!("{} {}", "✗".red(), message));
    }
}
