//! Build pipelines.
//!
//! A pipeline is a named, independently runnable build step: a set of input
//! patterns, one output directory and an async `run()` that either produces an
//! [`Artifact`] or fails with a [`Failure`]. Runs are idempotent and never leave
//! partial output behind (see [`output::StagedOutput`]).

mod copy;
pub mod output;
mod scripts;
mod styles;

pub use copy::{ImageCopy, MarkupCopy};
pub use scripts::{Environment, ScriptBundle, ScriptOptions};
pub use styles::{StyleOptions, StylesheetBundle};

use crate::error::{Failure, PipelineError, Stage};
use crate::patterns::PatternSet;
use crate::reload::ReloadScope;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Successful result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Pipeline that produced the artifact
    pub pipeline: String,
    /// Written files (absolute), in write order
    pub files: Vec<PathBuf>,
    /// Total bytes written
    pub bytes: u64,
    /// Wall time of the run
    pub duration: Duration,
}

impl Artifact {
    /// Written files relative to `root`; files outside `root` are kept as-is.
    pub fn files_relative_to(&self, root: &Path) -> Vec<PathBuf> {
        self.files
            .iter()
            .map(|file| {
                file.strip_prefix(root)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| file.clone())
            })
            .collect()
    }
}

/// A named, independently runnable build step.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Unique pipeline name (e.g. "styles")
    fn name(&self) -> &str;

    /// Patterns deciding which change events this pipeline owns
    fn input_patterns(&self) -> &PatternSet;

    /// Directory this pipeline writes into
    fn output_path(&self) -> &Path;

    /// What connected browsers should refresh after a successful run
    fn reload_scope(&self) -> ReloadScope;

    /// Perform the complete transformation.
    async fn run(&self) -> Result<Artifact, Failure>;
}

/// Shared handle to a pipeline.
pub type SharedPipeline = Arc<dyn Pipeline>;

/// Run blocking pipeline work off the async runtime.
///
/// A panic inside `work` becomes a transform failure instead of tearing down
/// the caller.
pub(crate) async fn run_blocking<T, F>(pipeline: &str, work: F) -> Result<T, Failure>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, Failure> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(join_error) => Err(Failure::new(
            pipeline,
            Stage::Transform,
            PipelineError::transform(format!("pipeline task aborted: {}", join_error)),
        )),
    }
}
