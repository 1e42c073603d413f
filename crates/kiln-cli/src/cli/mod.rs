//! Command-line interface definition.
//!
//! # Command Structure
//!
//! - `kiln build <target>` - Run one pipeline (or all) once
//! - `kiln watch` - Rebuild on change and notify browsers
//! - `kiln serve` - Serve the output directory
//! - `kiln dev` - Build everything, then watch and serve (the default)

mod commands;
mod tests;

use clap::Parser;
use std::path::PathBuf;

pub use commands::{BuildArgs, BuildTarget, Command, ConfigArgs, DevArgs, ServeArgs, WatchArgs};

/// Kiln - front-end asset pipeline with live reload
#[derive(Parser, Debug)]
#[command(
    name = "kiln",
    version,
    about = "Front-end asset pipeline with live reload",
    long_about = "Kiln bundles scripts, compiles SCSS, copies markup and images into an\n\
                  output directory, serves it locally and reloads connected browsers\n\
                  whenever a rebuild finishes."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Project root (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Config file (defaults to kiln.toml in the project root)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute; `dev` when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The subcommand to run, falling back to `dev`.
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Dev(DevArgs::default()))
    }

    /// Project root: `--cwd`, or the process working directory.
    pub fn project_root(&self) -> std::io::Result<PathBuf> {
        match &self.cwd {
            Some(dir) if dir.is_absolute() => Ok(dir.clone()),
            Some(dir) => Ok(std::env::current_dir()?.join(dir)),
            None => std::env::current_dir(),
        }
    }
}
