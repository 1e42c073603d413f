//! Logging setup for the Kiln CLI.
//!
//! Both crates log through `tracing`; this module installs the subscriber.
//!
//! The filter is chosen in this order:
//! 1. `--verbose`: debug for the kiln crates
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`
//! 4. info for the kiln crates
//!
//! # Example
//!
//! ```rust,no_run
//! use kiln_cli::logger::init_logger;
//!
//! init_logger(false, false, false);
//! tracing::info!(pipeline = "styles", "starting");
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERBOSE_FILTER: &str = "kiln=debug,kiln_pipeline=debug,kiln_cli=debug";
const QUIET_FILTER: &str = "error";
const DEFAULT_FILTER: &str = "kiln=info,kiln_pipeline=info,kiln_cli=info";

/// Initialize the tracing subscriber.
///
/// Call once at startup, before anything logs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(filter_for(verbose, quiet), no_color);
}

/// Initialize the tracing subscriber with an explicit filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}
