//! SCSS compilation, minification and vendor prefixing.
//!
//! Every non-partial `.scss` file under the style root is compiled with grass,
//! then parsed, minified and prefixed by lightningcss for the configured
//! browser targets. Output mirrors the source layout with a `.css` extension.

use super::output::StagedOutput;
use super::{run_blocking, Artifact, Pipeline};
use crate::error::{Failure, PipelineError, Stage};
use crate::patterns::PatternSet;
use crate::reload::ReloadScope;
use async_trait::async_trait;
use lightningcss::{
    printer::PrinterOptions,
    stylesheet::{MinifyOptions, ParserOptions, StyleSheet},
    targets::{Browsers, Targets},
};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Settings for [`StylesheetBundle`].
#[derive(Debug, Clone)]
pub struct StyleOptions {
    /// Directory whose layout the output mirrors (e.g. `assets/sass`)
    pub root: PathBuf,
    /// Patterns selecting the stylesheets
    pub inputs: PatternSet,
    /// Output directory
    pub out_dir: PathBuf,
    /// Browserslist queries for prefixing
    pub browsers: Vec<String>,
}

/// Compiles stylesheets to minified, prefixed CSS.
pub struct StylesheetBundle {
    options: StyleOptions,
}

impl StylesheetBundle {
    pub const NAME: &'static str = "styles";

    pub fn new(options: StyleOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Pipeline for StylesheetBundle {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn input_patterns(&self) -> &PatternSet {
        &self.options.inputs
    }

    fn output_path(&self) -> &Path {
        &self.options.out_dir
    }

    fn reload_scope(&self) -> ReloadScope {
        ReloadScope::Css
    }

    async fn run(&self) -> Result<Artifact, Failure> {
        let start = Instant::now();
        let options = self.options.clone();

        let written = run_blocking(Self::NAME, move || {
            let stage = compile_all(&options)?;
            stage
                .commit()
                .map_err(|e| Failure::new(Self::NAME, Stage::Write, e))
        })
        .await?;

        tracing::debug!(pipeline = Self::NAME, files = ?written.files, "stylesheets written");
        Ok(Artifact {
            pipeline: Self::NAME.to_string(),
            files: written.files,
            bytes: written.bytes,
            duration: start.elapsed(),
        })
    }
}

fn compile_all(options: &StyleOptions) -> Result<StagedOutput, Failure> {
    let fail = |stage, error| Failure::new(StylesheetBundle::NAME, stage, error);

    let targets = targets_for(&options.browsers).map_err(|e| fail(Stage::Transform, e))?;
    let mut stage = StagedOutput::new(&options.out_dir);

    for source in options.inputs.matching_files() {
        if is_partial(&source) || source.extension().map_or(true, |ext| ext != "scss") {
            continue;
        }

        let scss = std::fs::read_to_string(&source)
            .map_err(|e| fail(Stage::Read, PipelineError::io(&source, e)))?;
        let css = compile_scss(&source, &scss, &options.root)
            .map_err(|e| fail(Stage::Transform, e))?;
        let css = optimize_css(&source, &css, targets).map_err(|e| fail(Stage::Transform, e))?;

        let relative = source
            .strip_prefix(&options.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| source.file_name().map(PathBuf::from).unwrap_or_default())
            .with_extension("css");
        stage
            .add(relative, css.into_bytes())
            .map_err(|e| fail(Stage::Transform, e))?;
    }

    Ok(stage)
}

/// Files starting with `_` are only imported, never emitted.
fn is_partial(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('_'))
        .unwrap_or(false)
}

fn targets_for(browsers: &[String]) -> Result<Targets, PipelineError> {
    if browsers.is_empty() {
        return Ok(Targets::default());
    }
    let browsers = Browsers::from_browserslist(browsers.iter().map(String::as_str))
        .map_err(|e| PipelineError::transform(format!("invalid browser targets: {}", e)))?;
    Ok(browsers.map(Targets::from).unwrap_or_default())
}

fn compile_scss(path: &Path, source: &str, root: &Path) -> Result<String, PipelineError> {
    let parent = path.parent().unwrap_or(root);
    let options = grass::Options::default()
        .load_path(&parent)
        .load_path(&root);

    grass::from_string(source.to_string(), &options).map_err(|e| {
        let (line, column) = grass_location(&e.to_string()).unzip();
        PipelineError::Input {
            file: path.to_path_buf(),
            line,
            column,
            message: grass_message(&e.to_string()),
        }
    })
}

fn optimize_css(path: &Path, css: &str, targets: Targets) -> Result<String, PipelineError> {
    let filename = path.to_string_lossy().to_string();
    let mut stylesheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: filename.clone(),
            ..Default::default()
        },
    )
    .map_err(|e| PipelineError::Input {
        file: path.to_path_buf(),
        line: e.loc.as_ref().map(|loc| loc.line as usize + 1),
        column: e.loc.as_ref().map(|loc| loc.column as usize),
        message: e.kind.to_string(),
    })?;

    stylesheet
        .minify(MinifyOptions {
            targets,
            ..Default::default()
        })
        .map_err(|e| PipelineError::transform(format!("failed to minify {}: {}", filename, e)))?;

    let printed = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            ..Default::default()
        })
        .map_err(|e| PipelineError::transform(format!("failed to print {}: {}", filename, e)))?;

    Ok(printed.code)
}

/// First line of a grass error without the `Error: ` prefix.
fn grass_message(rendered: &str) -> String {
    rendered
        .lines()
        .next()
        .unwrap_or(rendered)
        .trim()
        .trim_start_matches("Error: ")
        .to_string()
}

/// `line:column` from the trailing location line of a grass error.
fn grass_location(rendered: &str) -> Option<(usize, usize)> {
    rendered
        .lines()
        .rev()
        .flat_map(str::split_whitespace)
        .find_map(|token| {
            let (line, column) = token.split_once(':')?;
            Some((line.parse().ok()?, column.parse().ok()?))
        })
}
