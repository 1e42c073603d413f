//! Status message functions for terminal output.

use super::colors_enabled;
use owo_colors::OwoColorize;

/// Print a success message to stderr.
pub fn success(message: &str) {
    if colors_enabled() {
        eprintln!("{} {}", "✓".green().bold(), message);
    } else {
        eprintln!("✓ {}", message);
    }
}

/// Print an info message to stderr.
pub fn info(message: &str) {
    if colors_enabled() {
        eprintln!("{} {}", "ℹ".blue().bold(), message);
    } else {
        eprintln!("ℹ {}", message);
    }
}

/// Print a warning message to stderr.
pub fn warning(message: &str) {
    if colors_enabled() {
        eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
    } else {
        eprintln!("⚠ {}", message);
    }
}

/// Print an error message to stderr.
///
/// Multi-line messages (e.g. a failure followed by a hint) keep their layout;
/// only the first line is colored.
pub fn error(message: &str) {
    let (head, rest) = message.split_once('\n').unwrap_or((message, ""));
    if colors_enabled() {
        eprintln!("{} {}", "✗".red().bold(), head.red());
    } else {
        eprintln!("✗ {}", head);
    }
    if !rest.is_empty() {
        eprintln!("{}", rest);
    }
}
