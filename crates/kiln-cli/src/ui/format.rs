//! Formatting for sizes, durations and build summaries.

use console::Term;
use kiln_pipeline::Artifact;
use owo_colors::OwoColorize;
use std::time::Duration;

/// Format a byte count with the largest fitting unit (B, KB, MB, GB).
///
/// ```
/// use kiln_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit + 1 < UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }

    match unit {
        0 => format!("{} B", bytes),
        _ => format!("{:.2} {}", size, UNITS[unit]),
    }
}

/// Format a duration as `ms`, seconds, or minutes and seconds.
///
/// ```
/// use kiln_cli::ui::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_millis(42)), "42ms");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    match duration.as_millis() {
        ms if ms < 1_000 => format!("{}ms", ms),
        ms if ms < 60_000 => format!("{:.2}s", duration.as_secs_f64()),
        _ => {
            let secs = duration.as_secs();
            format!("{}m {}s", secs / 60, secs % 60)
        }
    }
}

/// Print one line per pipeline artifact plus a total, to stderr.
pub fn print_build_summary(artifacts: &[Artifact]) {
    let width = (Term::stderr().size().1 as usize).min(60);

    eprintln!("\n{}", "Build Summary".bold().underline());
    eprintln!("{}", "─".repeat(width));

    for artifact in artifacts {
        let files = match artifact.files.len() {
            1 => "1 file".to_string(),
            n => format!("{} files", n),
        };
        eprintln!(
            "  {} {:<8} {} {} {}",
            "▸".blue(),
            artifact.pipeline.bright_white().bold(),
            format_size(artifact.bytes).dimmed(),
            files.dimmed(),
            format!("({})", format_duration(artifact.duration)).dimmed()
        );
    }

    eprintln!("{}", "─".repeat(width));

    let total_size: u64 = artifacts.iter().map(|a| a.bytes).sum();
    let slowest = artifacts
        .iter()
        .map(|a| a.duration)
        .max()
        .unwrap_or_default();
    eprintln!(
        "  {} {} in {}",
        "Total:".bold(),
        format_size(total_size).green(),
        format_duration(slowest).green()
    );
}
