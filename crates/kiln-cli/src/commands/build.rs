//! `kiln build`: run pipelines once and exit.

use crate::cli::BuildArgs;
use crate::commands::Project;
use crate::error::{BuildError, Result};
use crate::ui;
use kiln_pipeline::{Artifact, Failure, PipelineError, SharedPipeline, Stage};
use std::time::Instant;

/// Execute the build command.
///
/// Pipelines selected by the target run concurrently. Every failure is
/// reported; the command fails if any pipeline failed.
pub async fn execute(args: BuildArgs, project: &Project) -> Result<()> {
    let start = Instant::now();
    let config = project.load_config(&args.overrides)?;

    let pipelines = match args.target.pipeline_name() {
        Some(name) => vec![config.pipeline(&project.root, name)?],
        None => config.pipelines(&project.root)?,
    };

    let names: Vec<&str> = pipelines.iter().map(|p| p.name()).collect();
    tracing::debug!(environment = %config.environment, pipelines = ?names, "starting build");
    let spinner = ui::Spinner::new(&format!("Building {}...", names.join(", ")));

    let (artifacts, failures) = run_all(pipelines).await;

    match BuildError::from_failures(failures) {
        None => {
            spinner.finish(&format!(
                "Built {} in {}",
                plural(artifacts.len(), "pipeline"),
                ui::format_duration(start.elapsed())
            ));
            ui::print_build_summary(&artifacts);
            Ok(())
        }
        Some(err) => {
            spinner.fail("Build failed");
            if !artifacts.is_empty() {
                ui::print_build_summary(&artifacts);
            }
            Err(err.into())
        }
    }
}

/// Run every pipeline concurrently and split the outcomes.
///
/// Results keep the order of `pipelines`.
pub async fn run_all(pipelines: Vec<SharedPipeline>) -> (Vec<Artifact>, Vec<Failure>) {
    let handles: Vec<_> = pipelines
        .into_iter()
        .map(|pipeline| {
            let name = pipeline.name().to_string();
            (name, tokio::spawn(async move { pipeline.run().await }))
        })
        .collect();

    let mut artifacts = Vec::new();
    let mut failures = Vec::new();
    for (name, handle) in handles {
        match handle.await {
            Ok(Ok(artifact)) => {
                tracing::info!(
                    pipeline = %name,
                    files = artifact.files.len(),
                    size = %ui::format_size(artifact.bytes),
                    "pipeline finished"
                );
                artifacts.push(artifact);
            }
            Ok(Err(failure)) => {
                tracing::error!(pipeline = %name, stage = %failure.stage, "{}", failure.error);
                failures.push(failure);
            }
            Err(e) => failures.push(Failure::new(
                name,
                Stage::Transform,
                PipelineError::transform(format!("run aborted: {}", e)),
            )),
        }
    }

    (artifacts, failures)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
