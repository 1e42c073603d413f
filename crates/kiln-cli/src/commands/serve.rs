//! `kiln serve`: serve the output directory.

use crate::cli::ServeArgs;
use crate::commands::Project;
use crate::dev::DevServer;
use crate::error::Result;
use crate::ui;
use tokio::signal;

/// Execute the serve command.
///
/// Runs until Ctrl+C. A bind failure ends the command with an error.
pub async fn execute(args: ServeArgs, project: &Project) -> Result<()> {
    let config = project.load_config(&args.overrides)?;
    let root = config.output_root(&project.root);
    if !root.is_dir() {
        ui::warning(&format!(
            "{} does not exist yet; run `kiln build` first",
            root.display()
        ));
    }

    let server = DevServer::new(root, config.server_port, config.reload_port);
    tokio::select! {
        result = server.start() => result?,
        _ = signal::ctrl_c() => ui::info("Shutting down..."),
    }

    ui::success("Server stopped");
    Ok(())
}
