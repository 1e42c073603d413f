//! Kiln CLI - build, watch and serve front-end assets with live reload.
//!
//! The pipeline engine lives in `kiln-pipeline`; this crate wires it to the
//! command line, configuration, HTTP and the terminal.
//!
//! # Architecture
//!
//! - [`cli`] - Argument parsing with clap
//! - [`config`] - `kiln.toml` + environment + flags, merged with figment
//! - [`commands`] - `build`, `watch`, `serve` and `dev`
//! - [`dev`] - Static dev server and live-reload endpoint
//! - [`error`] - Error types with actionable hints
//! - [`logger`] - Tracing subscriber setup
//! - [`ui`] - Status lines, spinners and summaries
//!
//! # Example
//!
//! ```rust,no_run
//! use kiln_cli::commands;
//!
//! # async fn run() -> kiln_cli::Result<()> {
//! let project = commands::Project::new("/path/to/site");
//! let config = project.load_config(&Default::default())?;
//! assert_eq!(config.server_port, 8080);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{BuildError, CliError, ConfigError, Result};
