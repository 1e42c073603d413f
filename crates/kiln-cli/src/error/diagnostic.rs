//! Miette report conversion for CLI errors.

use crate::error::{BuildError, CliError};
use kiln_pipeline::{Failure, PipelineError};
use miette::Report;

/// Convert a [`CliError`] to a miette report for the final exit message.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => build_error_to_miette(e),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        _ => miette::miette!("{}", err),
    }
}

/// Convert a [`BuildError`] to a miette report.
pub fn build_error_to_miette(err: BuildError) -> Report {
    match err {
        BuildError::Pipeline(failure) => failure_to_miette(&failure),
        _ => miette::miette!("{}", err),
    }
}

fn failure_to_miette(failure: &Failure) -> Report {
    match &failure.error {
        PipelineError::Input { .. } => miette::miette!(
            "{} failed: {}\n\nHint: Fix the source file and save again",
            failure.pipeline,
            failure.error
        ),
        PipelineError::Io { path, .. } => miette::miette!(
            "{} failed during {}: {}\n\nHint: Check that {} exists and is writable",
            failure.pipeline,
            failure.stage,
            failure.error,
            path.display()
        ),
        PipelineError::Transform { .. } => miette::miette!("{}", failure),
    }
}
