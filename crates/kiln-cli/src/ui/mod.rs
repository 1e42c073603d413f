//! Terminal output: status lines, spinners and build summaries.
//!
//! Everything here writes to stderr so stdout stays free for piping. Colors
//! come from `owo-colors`, terminal detection from `console`.
//!
//! ```no_run
//! use kiln_cli::ui;
//!
//! ui::init_colors();
//! let spinner = ui::Spinner::new("Building styles...");
//! spinner.finish("styles built");
//! ui::success("Build complete");
//! ```

mod format;
mod messages;
mod spinner;

pub use format::{format_duration, format_size, print_build_summary};
pub use messages::{error, info, success, warning};
pub use spinner::Spinner;

use std::sync::atomic::{AtomicBool, Ordering};

static COLORS: AtomicBool = AtomicBool::new(true);

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

/// Check if color output should be enabled on stderr.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise colors are used when a
/// person is watching stderr.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }

    console::user_attended_stderr()
}

/// Decide once whether status lines and spinners are colored.
pub fn init_colors() {
    apply_colors(should_use_color() && !is_ci());
}

/// Force colors on or off, e.g. for `--no-color`.
pub fn apply_colors(enabled: bool) {
    COLORS.store(enabled, Ordering::Relaxed);
    console::set_colors_enabled_stderr(enabled);
}

pub(crate) fn colors_enabled() -> bool {
    COLORS.load(Ordering::Relaxed)
}
