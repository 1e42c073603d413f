//! Configuration with multi-source loading.
//!
//! Merges built-in defaults, `kiln.toml`, environment variables and CLI flags.
//! Priority: CLI > Environment > File > Defaults.
//!
//! All paths are relative to the project root.

mod defaults;
mod loading;
mod validation;

use kiln_pipeline::{
    Environment, ImageCopy, MarkupCopy, PatternSet, ScriptBundle, ScriptOptions, SharedPipeline,
    StyleOptions, StylesheetBundle,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{BuildError, ConfigError, Result};

pub use defaults::*;
pub use loading::ConfigOverrides;

/// Kiln configuration, loaded from `kiln.toml`, the environment and CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KilnConfig {
    /// `development` or `production`; only the script bundle reacts to it
    #[serde(default)]
    pub environment: Environment,

    /// Port of the live-reload endpoint
    #[serde(default = "default_reload_port")]
    pub reload_port: u16,

    /// Port of the dev server
    #[serde(default = "default_server_port")]
    pub server_port: u16,

    /// Watcher debounce window in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Abort pipeline runs that take longer than this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_timeout_ms: Option<u64>,

    /// Output root served by the dev server
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    #[serde(default)]
    pub scripts: ScriptsConfig,

    #[serde(default)]
    pub styles: StylesConfig,

    #[serde(default = "CopyConfig::markup")]
    pub markup: CopyConfig,

    #[serde(default = "CopyConfig::images")]
    pub images: CopyConfig,
}

/// `[scripts]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptsConfig {
    #[serde(default = "default_script_inputs")]
    pub inputs: Vec<String>,
    #[serde(default = "default_script_output")]
    pub output: PathBuf,
    /// Entry module of the bundle
    #[serde(default = "default_script_entry")]
    pub entry: PathBuf,
    /// Bundle file name inside `output`
    #[serde(default = "default_script_file_name")]
    pub file_name: String,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            inputs: default_script_inputs(),
            output: default_script_output(),
            entry: default_script_entry(),
            file_name: default_script_file_name(),
        }
    }
}

/// `[styles]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StylesConfig {
    #[serde(default = "default_style_inputs")]
    pub inputs: Vec<String>,
    #[serde(default = "default_style_output")]
    pub output: PathBuf,
    /// Directory whose layout the output mirrors
    #[serde(default = "default_style_root")]
    pub root: PathBuf,
    /// Browserslist queries for vendor prefixing
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            inputs: default_style_inputs(),
            output: default_style_output(),
            root: default_style_root(),
            browsers: default_browsers(),
        }
    }
}

/// `[markup]` and `[images]` tables.
///
/// Missing keys fall back to the markup defaults when deserialized on their
/// own; the loader always layers them over the right table first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopyConfig {
    #[serde(default = "default_markup_inputs")]
    pub inputs: Vec<String>,
    #[serde(default = "default_markup_output")]
    pub output: PathBuf,
    /// Paths are preserved relative to this directory
    #[serde(default = "default_markup_base")]
    pub base: PathBuf,
}

impl CopyConfig {
    pub fn markup() -> Self {
        Self {
            inputs: default_markup_inputs(),
            output: default_markup_output(),
            base: default_markup_base(),
        }
    }

    pub fn images() -> Self {
        Self {
            inputs: default_image_inputs(),
            output: default_image_output(),
            base: default_image_base(),
        }
    }
}

/// Names of all pipelines, in build order.
pub const PIPELINE_NAMES: [&str; 4] = [
    ScriptBundle::NAME,
    StylesheetBundle::NAME,
    MarkupCopy::NAME,
    ImageCopy::NAME,
];

impl KilnConfig {
    /// Built-in defaults.
    pub fn default_config() -> Self {
        Self {
            environment: Environment::default(),
            reload_port: default_reload_port(),
            server_port: default_server_port(),
            debounce_ms: default_debounce_ms(),
            run_timeout_ms: None,
            out_dir: default_out_dir(),
            scripts: ScriptsConfig::default(),
            styles: StylesConfig::default(),
            markup: CopyConfig::markup(),
            images: CopyConfig::images(),
        }
    }

    /// Absolute output root for `project_root`.
    pub fn output_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.out_dir)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_ms.map(Duration::from_millis)
    }

    /// Input patterns of the named pipeline.
    pub fn inputs_of(&self, name: &str) -> Option<&[String]> {
        match name {
            "scripts" => Some(self.scripts.inputs.as_slice()),
            "styles" => Some(self.styles.inputs.as_slice()),
            "markup" => Some(self.markup.inputs.as_slice()),
            "images" => Some(self.images.inputs.as_slice()),
            _ => None,
        }
    }

    /// Construct every pipeline, in [`PIPELINE_NAMES`] order.
    pub fn pipelines(&self, project_root: &Path) -> Result<Vec<SharedPipeline>> {
        PIPELINE_NAMES
            .iter()
            .map(|name| self.pipeline(project_root, name))
            .collect()
    }

    /// Construct the named pipeline.
    pub fn pipeline(&self, project_root: &Path, name: &str) -> Result<SharedPipeline> {
        let root = project_root;
        let pipeline: SharedPipeline = match name {
            "scripts" => Arc::new(ScriptBundle::new(ScriptOptions {
                root: root.to_path_buf(),
                entry: self.scripts.entry.clone(),
                inputs: patterns(root, "scripts.inputs", &self.scripts.inputs)?,
                out_dir: root.join(&self.scripts.output),
                file_name: self.scripts.file_name.clone(),
                environment: self.environment,
            })),
            "styles" => Arc::new(StylesheetBundle::new(StyleOptions {
                root: root.join(&self.styles.root),
                inputs: patterns(root, "styles.inputs", &self.styles.inputs)?,
                out_dir: root.join(&self.styles.output),
                browsers: self.styles.browsers.clone(),
            })),
            "markup" => Arc::new(MarkupCopy::new(
                root.join(&self.markup.base),
                patterns(root, "markup.inputs", &self.markup.inputs)?,
                root.join(&self.markup.output),
            )),
            "images" => Arc::new(ImageCopy::new(
                root.join(&self.images.base),
                patterns(root, "images.inputs", &self.images.inputs)?,
                root.join(&self.images.output),
            )),
            other => return Err(BuildError::UnknownPipeline(other.to_string()).into()),
        };
        Ok(pipeline)
    }
}

fn patterns(root: &Path, field: &str, inputs: &[String]) -> Result<PatternSet> {
    PatternSet::new(root, inputs).map_err(|e| {
        ConfigError::InvalidValue {
            field: field.to_string(),
            value: e.pattern.clone(),
            hint: format!("Fix the glob pattern ({})", e.source),
        }
        .into()
    })
}
