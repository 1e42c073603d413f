//! `kiln dev`: build everything, then watch and serve.
//!
//! The initial pass goes through the coordinator, so a change arriving while
//! it runs queues a rerun instead of racing it.

use crate::cli::DevArgs;
use crate::commands::watch::{server_exit, WatchSession};
use crate::commands::Project;
use crate::config::PIPELINE_NAMES;
use crate::dev::DevServer;
use crate::error::Result;
use crate::ui;
use tokio::signal;

/// Execute the dev command.
pub async fn execute(args: DevArgs, project: &Project) -> Result<()> {
    let config = project.load_config(&args.overrides)?;
    ui::info(&format!(
        "Starting {} build in {}",
        config.environment,
        project.root.display()
    ));

    let mut session = WatchSession::start(&config, project)?;
    for name in PIPELINE_NAMES {
        session.handle.trigger(name);
    }

    let server = DevServer::new(
        config.output_root(&project.root),
        config.server_port,
        config.reload_port,
    );
    let mut server_handle = tokio::spawn(server.start());

    ui::info("Press Ctrl+C to stop");
    let outcome = tokio::select! {
        _ = signal::ctrl_c() => {
            ui::info("Shutting down...");
            Ok(())
        }
        joined = &mut server_handle => server_exit("Server", joined),
        joined = &mut session.reload_server => server_exit("Reload endpoint", joined),
    };

    server_handle.abort();
    session.shutdown().await;
    outcome?;
    ui::success("Development server stopped");
    Ok(())
}
