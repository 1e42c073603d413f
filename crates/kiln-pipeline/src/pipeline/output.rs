//! Staged, all-or-nothing output writing.
//!
//! Pipelines compute every output in memory first, then commit. The commit
//! writes each file to a temporary sibling and renames it into place once all
//! temporaries exist. Replaced files are set aside until every rename has
//! succeeded, so a failed commit restores the previous output.

use crate::error::PipelineError;
use path_clean::PathClean;
use std::fs;
use std::path::{Component, Path, PathBuf};

const TEMP_SUFFIX: &str = ".kiln-tmp";
const BACKUP_SUFFIX: &str = ".kiln-old";

/// Files computed by a run, waiting to be written.
#[derive(Debug, Default)]
pub struct StagedOutput {
    out_dir: PathBuf,
    files: Vec<(PathBuf, Vec<u8>)>,
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    /// Absolute paths written, in staging order
    pub files: Vec<PathBuf>,
    /// Total bytes written
    pub bytes: u64,
}

impl StagedOutput {
    /// Create an empty stage targeting `out_dir`.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            files: Vec::new(),
        }
    }

    /// Stage `contents` for `relative` (relative to the output directory).
    ///
    /// # Errors
    ///
    /// Returns a transform error if `relative` is absolute or escapes the
    /// output directory.
    pub fn add(
        &mut self,
        relative: impl AsRef<Path>,
        contents: Vec<u8>,
    ) -> Result<(), PipelineError> {
        let relative = validate_relative(relative.as_ref())?;
        self.files.push((relative, contents));
        Ok(())
    }

    /// Number of staged files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every staged file.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error. Temporaries are removed and every target
    /// is left as it was before the commit.
    pub fn commit(self) -> Result<Written, PipelineError> {
        let mut temps: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(self.files.len());
        let mut bytes = 0u64;

        // Phase 1: temporaries
        for (relative, contents) in &self.files {
            let target = self.out_dir.join(relative);
            let temp = sibling(&target, TEMP_SUFFIX);

            let staged = target
                .parent()
                .map(fs::create_dir_all)
                .transpose()
                .and_then(|_| fs::write(&temp, contents));
            if let Err(e) = staged {
                cleanup(&temps);
                return Err(PipelineError::io(&target, e));
            }

            bytes += contents.len() as u64;
            temps.push((temp, target));
        }

        // Phase 2: rename into place, keeping what was replaced
        let mut swapped: Vec<Swapped> = Vec::with_capacity(temps.len());
        for (temp, target) in &temps {
            if let Err(e) = swap_in(temp, target, &mut swapped) {
                roll_back(&swapped);
                cleanup(&temps);
                return Err(PipelineError::io(target, e));
            }
        }
        for entry in &swapped {
            if let Some(backup) = &entry.backup {
                if let Err(e) = fs::remove_file(backup) {
                    tracing::warn!("failed to remove backup {}: {}", backup.display(), e);
                }
            }
        }

        Ok(Written {
            files: temps.into_iter().map(|(_, target)| target).collect(),
            bytes,
        })
    }
}

fn validate_relative(relative: &Path) -> Result<PathBuf, PipelineError> {
    let cleaned = relative.clean();
    let escapes = cleaned.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });

    if escapes || cleaned.as_os_str().is_empty() || cleaned == Path::new(".") {
        return Err(PipelineError::transform(format!(
            "output path '{}' escapes the output directory",
            relative.display()
        )));
    }
    Ok(cleaned)
}

fn sibling(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// A target renamed into place, with the file it replaced.
struct Swapped {
    target: PathBuf,
    backup: Option<PathBuf>,
}

fn swap_in(temp: &Path, target: &Path, swapped: &mut Vec<Swapped>) -> std::io::Result<()> {
    let backup = if target.is_file() {
        let backup = sibling(target, BACKUP_SUFFIX);
        fs::rename(target, &backup)?;
        Some(backup)
    } else {
        None
    };

    if let Err(e) = fs::rename(temp, target) {
        if let Some(backup) = &backup {
            restore(backup, target);
        }
        return Err(e);
    }

    swapped.push(Swapped {
        target: target.to_path_buf(),
        backup,
    });
    Ok(())
}

fn roll_back(swapped: &[Swapped]) {
    for entry in swapped.iter().rev() {
        match &entry.backup {
            Some(backup) => restore(backup, &entry.target),
            None => {
                if let Err(e) = fs::remove_file(&entry.target) {
                    tracing::warn!("failed to remove {}: {}", entry.target.display(), e);
                }
            }
        }
    }
}

fn restore(backup: &Path, target: &Path) {
    if let Err(e) = fs::rename(backup, target) {
        tracing::error!(
            "failed to restore {} from {}: {}",
            target.display(),
            backup.display(),
            e
        );
    }
}

fn cleanup(temps: &[(PathBuf, PathBuf)]) {
    for (temp, _) in temps {
        if temp.exists() {
            if let Err(e) = fs::remove_file(temp) {
                tracing::warn!("failed to remove temporary file {}: {}", temp.display(), e);
            }
        }
    }
}
