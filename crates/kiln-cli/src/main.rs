//! Kiln CLI entry point: parse arguments, set up logging, dispatch.

use clap::Parser;
use kiln_cli::{cli, commands, error, logger, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    if args.no_color {
        ui::apply_colors(false);
    } else {
        ui::init_colors();
    }

    // Errors become miette reports; any error exits with status 1
    run(&args).await.map_err(error::cli_error_to_miette)
}

async fn run(args: &cli::Cli) -> error::Result<()> {
    let project = commands::Project::from_cli(args)?;

    match args.command() {
        cli::Command::Build(build_args) => commands::build_execute(build_args, &project).await,
        cli::Command::Watch(watch_args) => commands::watch_execute(watch_args, &project).await,
        cli::Command::Serve(serve_args) => commands::serve_execute(serve_args, &project).await,
        cli::Command::Dev(dev_args) => commands::dev_execute(dev_args, &project).await,
    }
}
