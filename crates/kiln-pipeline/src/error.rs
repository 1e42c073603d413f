//! Error types for pipeline runs, watch registration and pattern parsing.
//!
//! A pipeline never panics or aborts the process on bad input: every problem is
//! captured as a [`PipelineError`] and wrapped in a [`Failure`] at the run
//! boundary, tagged with the [`Stage`] it came from.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Stage of a pipeline run where a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Discovering or reading source files
    Read,
    /// Compiling, bundling or minifying
    Transform,
    /// Writing output files
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Read => write!(f, "read"),
            Stage::Transform => write!(f, "transform"),
            Stage::Write => write!(f, "write"),
        }
    }
}

/// Errors produced inside a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed source input (e.g. invalid SCSS syntax)
    #[error("{location}: {message}", location = format_location(.file, .line, .column))]
    Input {
        /// File containing the error
        file: PathBuf,
        /// 1-indexed line, when known
        line: Option<usize>,
        /// 1-indexed column, when known
        column: Option<usize>,
        /// Error message from the compiler
        message: String,
    },

    /// The transformation itself failed unexpectedly
    #[error("{message}")]
    Transform {
        /// Diagnostic detail
        message: String,
    },

    /// Input could not be read or output could not be written
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Build an [`PipelineError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a [`PipelineError::Transform`] from any displayable message.
    pub fn transform(message: impl fmt::Display) -> Self {
        Self::Transform {
            message: message.to_string(),
        }
    }

    /// Returns true for malformed-input errors the operator can fix by saving again.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input { .. })
    }
}

fn format_location(file: &Path, line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!("{}:{}:{}", file.display(), line, column),
        (Some(line), None) => format!("{}:{}", file.display(), line),
        _ => file.display().to_string(),
    }
}

/// A failed pipeline run.
#[derive(Debug, Error)]
#[error("{pipeline} failed during {stage}: {error}")]
pub struct Failure {
    /// Name of the failing pipeline
    pub pipeline: String,
    /// Stage the failure came from
    pub stage: Stage,
    /// What went wrong
    pub error: PipelineError,
}

impl Failure {
    /// Create a failure for `pipeline` at `stage`.
    pub fn new(pipeline: impl Into<String>, stage: Stage, error: PipelineError) -> Self {
        Self {
            pipeline: pipeline.into(),
            stage,
            error,
        }
    }
}

/// Errors registering a file system watch.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The watch root could not be monitored. Fatal to this registration only.
    #[error("Cannot watch {}: {source}", .root.display())]
    Setup {
        /// Root directory of the registration
        root: PathBuf,
        /// Underlying notify error
        #[source]
        source: notify::Error,
    },

    /// The watch root does not exist
    #[error("Watch root does not exist: {}", .0.display())]
    MissingRoot(PathBuf),
}

/// Invalid glob pattern in a pipeline's input list.
#[derive(Debug, Error)]
#[error("Invalid pattern '{pattern}': {source}")]
pub struct PatternError {
    /// The offending pattern
    pub pattern: String,
    /// Underlying glob error
    #[source]
    pub source: ignore::Error,
}
