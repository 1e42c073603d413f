//! Kiln pipeline engine - build pipelines, change watching and run coordination.
//!
//! This crate holds everything between "a file changed on disk" and "the browser
//! should reload". The CLI crate wires it to configuration, HTTP and the terminal.
//!
//! # Architecture
//!
//! - [`pipeline`] - The [`Pipeline`] trait and the four concrete pipelines
//!   (script bundle, stylesheet bundle, markup copy, image copy)
//! - [`watcher`] - File system watcher that emits debounced [`ChangeEvent`]s
//! - [`coordinator`] - Single-flight [`RunCoordinator`] routing events to pipelines
//! - [`reload`] - [`ReloadBroadcaster`] fanning notifications out to browser clients
//! - [`patterns`] - Glob pattern sets used for routing and input discovery
//!
//! # Example
//!
//! ```rust,no_run
//! use kiln_pipeline::{ReloadBroadcaster, RunCoordinator, SharedPipeline};
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//!
//! # async fn example(pipelines: Vec<SharedPipeline>) {
//! let broadcaster = Arc::new(ReloadBroadcaster::new());
//! let (tx, rx) = mpsc::channel(256);
//! let coordinator = RunCoordinator::new(pipelines, broadcaster);
//! let handle = coordinator.handle();
//! tokio::spawn(coordinator.run(rx));
//! # drop((tx, handle));
//! # }
//! ```

pub mod coordinator;
pub mod error;
pub mod patterns;
pub mod pipeline;
pub mod reload;
pub mod watcher;

pub use coordinator::{
    CoordinatorEvent, CoordinatorHandle, RunCoordinator, RunOutcome, RunState, RunStatus,
};
pub use error::{Failure, PatternError, PipelineError, Stage, WatchError};
pub use patterns::PatternSet;
pub use pipeline::{
    Artifact, Environment, ImageCopy, MarkupCopy, Pipeline, ScriptBundle, ScriptOptions,
    SharedPipeline, StyleOptions, StylesheetBundle,
};
pub use reload::{ReloadBroadcaster, ReloadNotification, ReloadNotifier, ReloadScope};
pub use watcher::{ChangeEvent, ChangeKind, ChangeWatcher, Debouncer};
