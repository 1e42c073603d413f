//! Verbatim copy pipelines for markup and images.

use super::output::StagedOutput;
use super::{run_blocking, Artifact, Pipeline};
use crate::error::{Failure, PipelineError, Stage};
use crate::patterns::PatternSet;
use crate::reload::ReloadScope;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone)]
struct CopySet {
    name: &'static str,
    base: PathBuf,
    inputs: PatternSet,
    out_dir: PathBuf,
}

impl CopySet {
    async fn run(&self) -> Result<Artifact, Failure> {
        let start = Instant::now();
        let set = self.clone();
        let name = self.name;

        let written = run_blocking(name, move || {
            let mut stage = StagedOutput::new(&set.out_dir);
            for source in set.inputs.matching_files() {
                let contents = std::fs::read(&source)
                    .map_err(|e| Failure::new(name, Stage::Read, PipelineError::io(&source, e)))?;
                stage
                    .add(set.relative(&source), contents)
                    .map_err(|e| Failure::new(name, Stage::Transform, e))?;
            }
            stage
                .commit()
                .map_err(|e| Failure::new(name, Stage::Write, e))
        })
        .await?;

        tracing::debug!(pipeline = name, files = ?written.files, "files copied");
        Ok(Artifact {
            pipeline: name.to_string(),
            files: written.files,
            bytes: written.bytes,
            duration: start.elapsed(),
        })
    }

    /// Path below `base`, or just the file name for files outside it.
    fn relative(&self, source: &Path) -> PathBuf {
        source
            .strip_prefix(&self.base)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| source.file_name().map(PathBuf::from).unwrap_or_default())
    }
}

/// Copies HTML pages into the output root.
pub struct MarkupCopy {
    set: CopySet,
}

impl MarkupCopy {
    pub const NAME: &'static str = "markup";

    /// Copy files matching `inputs`, keeping their path relative to `base`.
    pub fn new(base: impl Into<PathBuf>, inputs: PatternSet, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            set: CopySet {
                name: Self::NAME,
                base: base.into(),
                inputs,
                out_dir: out_dir.into(),
            },
        }
    }
}

#[async_trait]
impl Pipeline for MarkupCopy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn input_patterns(&self) -> &PatternSet {
        &self.set.inputs
    }

    fn output_path(&self) -> &Path {
        &self.set.out_dir
    }

    fn reload_scope(&self) -> ReloadScope {
        ReloadScope::Full
    }

    async fn run(&self) -> Result<Artifact, Failure> {
        self.set.run().await
    }
}

/// Copies image files into the image output directory.
pub struct ImageCopy {
    set: CopySet,
}

impl ImageCopy {
    pub const NAME: &'static str = "images";

    /// Copy files matching `inputs`, keeping their path relative to `base`.
    pub fn new(base: impl Into<PathBuf>, inputs: PatternSet, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            set: CopySet {
                name: Self::NAME,
                base: base.into(),
                inputs,
                out_dir: out_dir.into(),
            },
        }
    }
}

#[async_trait]
impl Pipeline for ImageCopy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn input_patterns(&self) -> &PatternSet {
        &self.set.inputs
    }

    fn output_path(&self) -> &Path {
        &self.set.out_dir
    }

    fn reload_scope(&self) -> ReloadScope {
        ReloadScope::Image
    }

    async fn run(&self) -> Result<Artifact, Failure> {
        self.set.run().await
    }
}
