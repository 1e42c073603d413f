//! Glob pattern sets for routing change events and discovering inputs.
//!
//! Patterns use gitignore-style globs relative to a project root: a pattern
//! without a slash (`*.scss`) matches a file name anywhere, a pattern with a
//! slash (`assets/sass/**/*.scss`) is anchored at the root. Brace alternation
//! (`*.{png,svg}`) is supported.

use crate::error::PatternError;
use ignore::overrides::{Override, OverrideBuilder};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Ordered set of input patterns for one pipeline.
#[derive(Debug, Clone)]
pub struct PatternSet {
    root: PathBuf,
    patterns: Vec<String>,
    matcher: Override,
}

impl PatternSet {
    /// Compile `patterns` relative to `root`.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] for the first pattern that fails to parse.
    pub fn new<S: AsRef<str>>(
        root: impl Into<PathBuf>,
        patterns: &[S],
    ) -> Result<Self, PatternError> {
        let root = root.into();
        let mut builder = OverrideBuilder::new(&root);
        let mut normalized = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            let pattern = pattern.as_ref().trim_start_matches("./").to_string();
            builder.add(&pattern).map_err(|source| PatternError {
                pattern: pattern.clone(),
                source,
            })?;
            normalized.push(pattern);
        }

        let matcher = builder.build().map_err(|source| PatternError {
            pattern: normalized.join(", "),
            source,
        })?;

        Ok(Self {
            root,
            patterns: normalized,
            matcher,
        })
    }

    /// Project root the patterns are relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The normalized patterns, in declaration order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check whether `path` is covered by any pattern.
    ///
    /// Absolute paths must live under the root. Relative paths are taken as
    /// relative to the root.
    pub fn is_match(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }

        let relative = if path.is_absolute() {
            match path.strip_prefix(&self.root) {
                Ok(rel) => rel,
                Err(_) => return false,
            }
        } else {
            path
        };

        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return false;
        }

        self.matcher.matched(relative, false).is_whitelist()
    }

    /// Directories to watch so that every pattern is observed.
    ///
    /// Each pattern contributes its literal prefix (the components before the
    /// first glob metacharacter). Nested roots are folded into their parents.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = self
            .patterns
            .iter()
            .map(|pattern| self.root.join(literal_prefix(pattern)))
            .collect();

        roots.sort();
        roots.dedup();

        let mut folded: Vec<PathBuf> = Vec::new();
        for root in roots {
            if !folded.iter().any(|parent| root.starts_with(parent)) {
                folded.push(root);
            }
        }
        folded
    }

    /// Every existing file under the watch roots that matches, sorted.
    pub fn matching_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self
            .watch_roots()
            .into_iter()
            .flat_map(|root| {
                WalkDir::new(root)
                    .follow_links(true)
                    .into_iter()
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.file_type().is_file())
                    .map(|entry| entry.into_path())
            })
            .filter(|path| self.is_match(path))
            .collect();

        files.sort();
        files.dedup();
        files
    }
}

/// Directory part of a pattern that contains no glob metacharacters.
fn literal_prefix(pattern: &str) -> PathBuf {
    // A slash-free pattern matches at any depth.
    if !pattern.trim_start_matches('/').contains('/') {
        return PathBuf::new();
    }

    let mut prefix = PathBuf::new();
    let mut segments = pattern.trim_start_matches('/').split('/').peekable();
    while let Some(segment) = segments.next() {
        // The last segment names files, never a directory to watch.
        if segments.peek().is_none() || segment.contains(['*', '?', '[', '{']) {
            break;
        }
        prefix.push(segment);
    }
    prefix
}
