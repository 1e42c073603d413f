//! `kiln watch`: rebuild on change and notify connected browsers.

use crate::cli::WatchArgs;
use crate::commands::Project;
use crate::config::KilnConfig;
use crate::dev::ReloadServer;
use crate::error::{CliError, Result};
use crate::ui;
use kiln_pipeline::{
    ChangeWatcher, CoordinatorEvent, CoordinatorHandle, ReloadBroadcaster, RunCoordinator,
    RunState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

/// Capacity of the watcher to coordinator channel.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// How long shutdown waits for in-flight runs.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Execute the watch command.
///
/// No initial build: pipelines run when their inputs change. Use `kiln dev`
/// to build everything first.
pub async fn execute(args: WatchArgs, project: &Project) -> Result<()> {
    let config = project.load_config(&args.overrides)?;
    let mut session = WatchSession::start(&config, project)?;

    ui::info("Press Ctrl+C to stop");
    let outcome = tokio::select! {
        _ = signal::ctrl_c() => {
            ui::info("Shutting down...");
            Ok(())
        }
        joined = &mut session.reload_server => server_exit("Reload endpoint", joined),
    };

    session.shutdown().await;
    outcome?;
    ui::success("Watch stopped");
    Ok(())
}

/// Turn the exit of a server task into the command's error.
///
/// A server only returns when it failed, so even a clean exit is an error.
pub(crate) fn server_exit(
    name: &str,
    joined: std::result::Result<Result<()>, JoinError>,
) -> Result<()> {
    match joined {
        Ok(Err(e)) => Err(e),
        Ok(Ok(())) => Err(CliError::Server(format!("{} stopped unexpectedly", name))),
        Err(e) => Err(CliError::Server(format!("{} task failed: {}", name, e))),
    }
}

/// Watcher, coordinator and reload endpoint running together.
pub(crate) struct WatchSession {
    watcher: ChangeWatcher,
    coordinator: JoinHandle<Vec<(String, RunState)>>,
    reporter: JoinHandle<()>,
    pub(crate) handle: CoordinatorHandle,
    pub(crate) reload_server: JoinHandle<Result<()>>,
}

impl WatchSession {
    /// Start watching every pipeline of `config`.
    ///
    /// Roots that cannot be watched are reported and skipped.
    pub(crate) fn start(config: &KilnConfig, project: &Project) -> Result<Self> {
        let pipelines = config.pipelines(&project.root)?;
        let output_root = config.output_root(&project.root);
        let broadcaster = Arc::new(ReloadBroadcaster::new());

        let server = ReloadServer::new(config.reload_port, broadcaster.clone());
        let reload_server = tokio::spawn(server.start());

        let patterns = pipelines
            .iter()
            .map(|p| p.input_patterns().clone())
            .collect();
        let (tx, rx) = mpsc::channel(CHANGE_CHANNEL_CAPACITY);
        let (watcher, errors) =
            ChangeWatcher::start(patterns, vec![output_root.clone()], config.debounce(), tx);
        for error in errors {
            ui::warning(&error.to_string());
        }
        for root in watcher.roots() {
            ui::info(&format!("Watching {}", display_relative(root, &project.root)));
        }

        let mut coordinator = RunCoordinator::new(pipelines, broadcaster)
            .with_output_root(output_root)
            .with_run_timeout(config.run_timeout());
        let events = coordinator.subscribe();
        let handle = coordinator.handle();

        Ok(Self {
            watcher,
            coordinator: tokio::spawn(coordinator.run(rx)),
            reporter: tokio::spawn(report(events)),
            handle,
            reload_server,
        })
    }

    /// Stop watching and wait briefly for in-flight runs.
    pub(crate) async fn shutdown(self) {
        drop(self.watcher);
        match tokio::time::timeout(SHUTDOWN_GRACE, self.coordinator).await {
            Ok(Ok(states)) => {
                for (name, state) in states {
                    tracing::debug!(
                        pipeline = %name,
                        runs = state.runs_started(),
                        last = ?state.last_outcome(),
                        "pipeline stopped"
                    );
                }
            }
            Ok(Err(e)) => tracing::warn!("coordinator task failed: {}", e),
            Err(_) => tracing::warn!("runs still in flight after {:?}; exiting", SHUTDOWN_GRACE),
        }
        self.reporter.abort();
        self.reload_server.abort();
    }
}

/// Print coordinator progress as status lines.
async fn report(mut events: mpsc::UnboundedReceiver<CoordinatorEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            CoordinatorEvent::RunStarted { pipeline } => {
                tracing::debug!(pipeline = %pipeline, "run started");
            }
            CoordinatorEvent::RerunQueued { pipeline } => {
                tracing::debug!(pipeline = %pipeline, "change during run, rerun queued");
            }
            CoordinatorEvent::RunFinished {
                pipeline,
                result: Ok(artifact),
            } => ui::success(&format!(
                "{} rebuilt ({}, {})",
                pipeline,
                ui::format_size(artifact.bytes),
                ui::format_duration(artifact.duration)
            )),
            CoordinatorEvent::RunFinished {
                result: Err(failure),
                ..
            } => ui::error(&failure.to_string()),
        }
    }
}

fn display_relative(path: &std::path::Path, root: &std::path::Path) -> String {
    path.strip_prefix(root)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_bind_error_is_returned() {
        let task = tokio::spawn(async {
            Err::<(), _>(CliError::Server("Failed to bind to 127.0.0.1:1: denied".into()))
        });
        let err = server_exit("Reload endpoint", task.await).unwrap_err();
        assert!(err.to_string().contains("Failed to bind"));
    }

    #[tokio::test]
    async fn test_server_clean_exit_is_still_error() {
        let task = tokio::spawn(async { Ok::<(), CliError>(()) });
        let err = server_exit("Server", task.await).unwrap_err();
        assert!(matches!(err, CliError::Server(ref msg) if msg.contains("stopped unexpectedly")));
    }

    #[tokio::test]
    async fn test_server_panic_is_error() {
        let task = tokio::spawn(async {
            if true {
                panic!("boom");
            }
            Ok::<(), CliError>(())
        });
        let err = server_exit("Server", task.await).unwrap_err();
        assert!(err.to_string().contains("Server task failed"));
    }
}
