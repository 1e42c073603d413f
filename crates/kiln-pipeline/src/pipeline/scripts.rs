//! JavaScript bundling with rolldown.

use super::output::StagedOutput;
use super::{run_blocking, Artifact, Pipeline};
use crate::error::{Failure, PipelineError, Stage};
use crate::patterns::PatternSet;
use crate::reload::ReloadScope;
use async_trait::async_trait;
use path_clean::PathClean;
use rolldown::{
    BundlerBuilder, BundlerOptions, InputItem, OutputFormat, Platform, RawMinifyOptions,
    SourceMapType,
};
use rolldown_common::Output;
use serde::{Deserialize, Deserializer, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

/// Build environment, as in `NODE_ENV`.
///
/// Only `production` (or `prod`, any case) selects a production build; every
/// other value, `test` and `staging` included, means development.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Readable output with source maps
    #[default]
    Development,
    /// Minified output, no source maps
    Production,
}

impl Environment {
    /// Interpret a `NODE_ENV`-style value.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name.eq_ignore_ascii_case("production") || name.eq_ignore_ascii_case("prod") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    /// Value substituted for `process.env.NODE_ENV`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Check if this is a production build.
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl<'de> Deserialize<'de> for Environment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

/// Settings for [`ScriptBundle`].
#[derive(Debug, Clone)]
pub struct ScriptOptions {
    /// Project root; the entry is resolved against it
    pub root: PathBuf,
    /// Entry module, relative to the root
    pub entry: PathBuf,
    /// Patterns whose changes trigger a rebuild
    pub inputs: PatternSet,
    /// Output directory
    pub out_dir: PathBuf,
    /// Bundle file name inside `out_dir`
    pub file_name: String,
    /// Development or production build
    pub environment: Environment,
}

/// Bundles the application entry into a single browser script.
pub struct ScriptBundle {
    options: ScriptOptions,
}

impl ScriptBundle {
    pub const NAME: &'static str = "scripts";

    pub fn new(options: ScriptOptions) -> Self {
        Self { options }
    }

    fn bundler_options(&self, entry: &Path) -> BundlerOptions {
        let production = self.options.environment.is_production();
        let name = Path::new(&self.options.file_name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bundle".to_string());

        BundlerOptions {
            input: Some(vec![InputItem {
                name: Some(name),
                import: entry.to_string_lossy().into_owned(),
            }]),
            cwd: Some(self.options.root.clone()),
            format: Some(OutputFormat::Iife),
            platform: Some(Platform::Browser),
            sourcemap: (!production).then_some(SourceMapType::File),
            minify: production.then(|| RawMinifyOptions::from(true)),
            define: Some(
                [(
                    "process.env.NODE_ENV".to_string(),
                    format!("\"{}\"", self.options.environment.as_str()),
                )]
                .into_iter()
                .collect(),
            ),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Pipeline for ScriptBundle {
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
        ReloadScope::Full
    }

    async fn run(&self) -> Result<Artifact, Failure> {
        let start = Instant::now();
        let entry = self.options.root.join(&self.options.entry).clean();

        if let Err(e) = std::fs::metadata(&entry) {
            return Err(Failure::new(Self::NAME, Stage::Read, PipelineError::io(&entry, e)));
        }

        let bundler_options = self.bundler_options(&entry);
        let out_dir = self.options.out_dir.clone();
        let file_name = self.options.file_name.clone();
        let runtime = tokio::runtime::Handle::current();

        let stage = run_blocking(Self::NAME, move || {
            runtime.block_on(bundle(bundler_options, out_dir, &file_name))
        })
        .await?;

        let written = run_blocking(Self::NAME, move || {
            stage
                .commit()
                .map_err(|e| Failure::new(Self::NAME, Stage::Write, e))
        })
        .await?;

        let artifact = Artifact {
            pipeline: Self::NAME.to_string(),
            files: written.files,
            bytes: written.bytes,
            duration: start.elapsed(),
        };
        tracing::debug!(pipeline = Self::NAME, files = ?artifact.files, "bundle written");
        Ok(artifact)
    }
}

/// Run rolldown and stage its in-memory output.
async fn bundle(
    options: BundlerOptions,
    out_dir: PathBuf,
    file_name: &str,
) -> Result<StagedOutput, Failure> {
    let transform_failure =
        |e: &dyn fmt::Debug| Failure::new(ScriptBundle::NAME, Stage::Transform, describe(e));

    let mut bundler = BundlerBuilder::default()
        .with_options(options)
        .build()
        .map_err(|e| transform_failure(&e))?;

    let output = bundler.generate().await.map_err(|e| transform_failure(&e))?;

    let mut stage = StagedOutput::new(out_dir);
    let mut entry_written = false;
    for item in output.assets {
        let staged = match item {
            Output::Chunk(chunk) if !entry_written => {
                entry_written = true;
                stage.add(file_name, chunk.code.clone().into_bytes())
            }
            Output::Chunk(chunk) => {
                stage.add(chunk.filename.as_str(), chunk.code.clone().into_bytes())
            }
            Output::Asset(asset) => stage.add(
                asset.filename.as_str(),
                asset.source.as_bytes().to_vec(),
            ),
        };
        staged.map_err(|e| Failure::new(ScriptBundle::NAME, Stage::Transform, e))?;
    }

    if !entry_written {
        return Err(Failure::new(
            ScriptBundle::NAME,
            Stage::Transform,
            PipelineError::transform("bundler produced no output chunk"),
        ));
    }
    Ok(stage)
}

/// Turn bundler diagnostics into a pipeline error.
///
/// Parse errors are reported as input errors so the operator sees a source
/// location; everything else is a transform error.
fn describe(error: &dyn fmt::Debug) -> PipelineError {
    let text = format!("{error:?}");
    match parse_location(&text) {
        Some((file, line, column)) if looks_like_syntax_error(&text) => PipelineError::Input {
            file,
            line: Some(line),
            column: Some(column),
            message: first_line(&text),
        },
        _ => PipelineError::transform(first_line(&text)),
    }
}

fn looks_like_syntax_error(text: &str) -> bool {
    ["Parse error", "Syntax", "Expected", "Unexpected token"]
        .iter()
        .any(|needle| text.contains(needle))
}

fn first_line(text: &str) -> String {
    let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or(text);
    line.trim().chars().take(500).collect()
}

/// Find the first `path.ext:line:column` triple in a diagnostic dump.
fn parse_location(text: &str) -> Option<(PathBuf, usize, usize)> {
    text.split(|c: char| c.is_whitespace() || matches!(c, '"' | '(' | ')' | '[' | ']' | ','))
        .find_map(|token| {
            let mut parts = token.rsplitn(3, ':');
            let column = parts.next()?.parse().ok()?;
            let line = parts.next()?.parse().ok()?;
            let file = parts.next()?;
            Path::new(file)
                .extension()
                .map(|_| (PathBuf::from(file), line, column))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!(Environment::from_name(" Production "), Environment::Production);
        assert_eq!(Environment::from_name("dev"), Environment::Development);
        assert_eq!(Environment::from_name("staging"), Environment::Development);
        assert_eq!(Environment::from_name("test"), Environment::Development);
        assert_eq!(Environment::default(), Environment::Development);
    }

    #[test]
    fn test_parse_location() {
        let text = "BatchedBuildDiagnostic { message: \"Expected `;`\", at app/index.js:4:12 }";
        let (file, line, column) = parse_location(text).unwrap();
        assert_eq!(file, PathBuf::from("app/index.js"));
        assert_eq!((line, column), (4, 12));
    }

    #[test]
    fn test_describe_classifies_syntax_errors() {
        let err = describe(&"Unexpected token at app/main.js:1:5");
        assert!(err.is_input());

        let err = describe(&"Could not resolve './missing'");
        assert!(matches!(err, PipelineError::Transform { .. }));
    }

    #[test]
    fn test_bundler_options_follow_environment() {
        let root = PathBuf::from("/project");
        let options = |environment| ScriptOptions {
            root: root.clone(),
            entry: PathBuf::from("app/index.js"),
            inputs: PatternSet::new(&root, &["app/**/*.js"]).unwrap(),
            out_dir: root.join("static/js"),
            file_name: "bundle.js".to_string(),
            environment,
        };

        let dev = ScriptBundle::new(options(Environment::Development));
        let dev_opts = dev.bundler_options(Path::new("/project/app/index.js"));
        assert!(dev_opts.sourcemap.is_some());
        assert!(dev_opts.minify.is_none());
        assert_eq!(
            dev_opts.input.unwrap()[0].name.as_deref(),
            Some("bundle")
        );

        let prod = ScriptBundle::new(options(Environment::Production));
        let prod_opts = prod.bundler_options(Path::new("/project/app/index.js"));
        assert!(prod_opts.sourcemap.is_none());
        assert!(prod_opts.minify.is_some());
    }
}
