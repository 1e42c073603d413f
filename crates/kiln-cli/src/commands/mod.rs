//! Command implementations for the Kiln CLI.
//!
//! - [`build`] - Run pipelines once
//! - [`watch`] - Rebuild on change and push reloads
//! - [`serve`] - Serve the output directory
//! - [`dev`] - Build, then watch and serve
//!
//! Each command exposes an `execute` function taking its parsed arguments and
//! the [`Project`] they apply to.

pub mod build;
pub mod dev;
pub mod serve;
pub mod watch;

pub use build::execute as build_execute;
pub use dev::execute as dev_execute;
pub use serve::execute as serve_execute;
pub use watch::execute as watch_execute;

use crate::cli::{Cli, ConfigArgs};
use crate::config::{ConfigOverrides, KilnConfig};
use crate::error::{CliError, Result};
use std::path::PathBuf;

/// Project root plus the config file chosen on the command line.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config_file: Option<PathBuf>,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config_file: None,
        }
    }

    /// Resolve `--cwd` and `--config`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::FileNotFound`] if the root is not a directory.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let root = cli.project_root()?;
        if !root.is_dir() {
            return Err(CliError::FileNotFound(root));
        }
        Ok(Self {
            config_file: cli.config.clone(),
            ..Self::new(root)
        })
    }

    /// Load and validate configuration with `args` applied on top.
    pub fn load_config(&self, args: &ConfigArgs) -> Result<KilnConfig> {
        KilnConfig::load(
            &self.root,
            self.config_file.as_deref(),
            &ConfigOverrides::from(args),
        )
    }
}
