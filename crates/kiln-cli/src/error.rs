//! Error handling for the Kiln CLI.
//!
//! Pipeline errors come from `kiln-pipeline` as typed values; this module wraps
//! them, together with configuration and server problems, into one
//! [`CliError`] that `main` turns into a `miette` report.
//!
//! # Architecture
//!
//! - **Top-level errors** (`CliError`) represent broad categories of failures
//! - **Domain-specific errors** (`ConfigError`, `BuildError`) carry hints

mod diagnostic;

use kiln_pipeline::Failure;
use std::path::PathBuf;
use thiserror::Error;

pub use diagnostic::cli_error_to_miette;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration-related errors (bad file, invalid values)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// One or more pipelines failed
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Dev server or reload endpoint errors
    #[error("Server error: {0}")]
    Server(String),
}

/// Configuration errors.
///
/// Raised while loading `kiln.toml` and the environment, and by validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Explicit config file doesn't exist
    #[error("Config file not found: {}\n\nHint: Create a kiln.toml file or pass a valid --config <path>", .0.display())]
    NotFound(PathBuf),

    /// Missing required configuration field
    #[error("Missing required field: {field}\n\nHint: {hint}")]
    MissingField {
        /// Name of the missing field
        field: String,
        /// Helpful hint for providing the field
        hint: String,
    },

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The invalid value
        value: String,
        /// Helpful hint for correct values
        hint: String,
    },

    /// Mutually exclusive values were configured
    #[error("Conflicting options: {0}\n\nHint: These options cannot share a value")]
    ConflictingOptions(String),
}

/// Errors from one-shot builds.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A pipeline run returned a failure
    #[error("{0}")]
    Pipeline(#[from] Failure),

    /// Several pipelines failed in the same build
    #[error("{} pipelines failed:\n{}", .0.len(), format_failures(.0))]
    Multiple(Vec<Failure>),

    /// A name that matches no configured pipeline
    #[error("Unknown pipeline: {0}\n\nHint: Use one of scripts, styles, markup, images or all")]
    UnknownPipeline(String),
}

impl BuildError {
    /// Collapse a list of failures into the most specific variant.
    pub fn from_failures(mut failures: Vec<Failure>) -> Option<Self> {
        match failures.len() {
            0 => None,
            1 => failures.pop().map(BuildError::Pipeline),
            _ => Some(BuildError::Multiple(failures)),
        }
    }
}

fn format_failures(failures: &[Failure]) -> String {
    failures
        .iter()
        .map(|f| format!("  - {}", f))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_pipeline::{PipelineError, Stage};

    fn failure(pipeline: &str) -> Failure {
        Failure::new(
            pipeline,
            Stage::Transform,
            PipelineError::Input {
                file: PathBuf::from("assets/sass/main.scss"),
                line: Some(2),
                column: Some(9),
                message: "expected \";\".".to_string(),
            },
        )
    }

    #[test]
    fn test_config_error_not_found() {
        let err = ConfigError::NotFound(PathBuf::from("kiln.toml"));
        let msg = err.to_string();
        assert!(msg.contains("Config file not found"));
        assert!(msg.contains("kiln.toml"));
        assert!(msg.contains("Hint:"));
    }

    #[test]
    fn test_config_error_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "debounce_ms".to_string(),
            value: "5".to_string(),
            hint: "Use a window between 10 and 2000 ms".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Invalid value for 'debounce_ms'"));
        assert!(msg.contains("between 10 and 2000"));
    }

    #[test]
    fn test_config_error_missing_field() {
        let err = ConfigError::MissingField {
            field: "styles.inputs".to_string(),
            hint: "List at least one pattern".to_string(),
        };
        assert!(err
            .to_string()
            .contains("Missing required field: styles.inputs"));
    }

    #[test]
    fn test_build_error_shows_location() {
        let err: CliError = BuildError::Pipeline(failure("styles")).into();
        let msg = err.to_string();
        assert!(msg.contains("styles failed during transform"));
        assert!(msg.contains("assets/sass/main.scss:2:9"));
    }

    #[test]
    fn test_from_failures() {
        assert!(BuildError::from_failures(vec![]).is_none());
        assert!(matches!(
            BuildError::from_failures(vec![failure("styles")]),
            Some(BuildError::Pipeline(_))
        ));

        let err = BuildError::from_failures(vec![failure("styles"), failure("scripts")]).unwrap();
        let msg = err.to_string();
        assert!(msg.starts_with("2 pipelines failed"));
        assert!(msg.contains("  - scripts failed"));
    }
}
