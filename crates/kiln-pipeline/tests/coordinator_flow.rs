//! End-to-end flow: change event -> stylesheet pipeline -> browser notification.

use kiln_pipeline::{
    ChangeEvent, ChangeKind, CoordinatorEvent, ImageCopy, PatternSet, ReloadBroadcaster,
    RunCoordinator, SharedPipeline, StyleOptions, StylesheetBundle,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn pipelines(root: &Path) -> Vec<SharedPipeline> {
    let styles = StylesheetBundle::new(StyleOptions {
        root: root.join("assets/sass"),
        inputs: PatternSet::new(root, &["assets/sass/**/*.scss"]).unwrap(),
        out_dir: root.join("static/css"),
        browsers: vec!["> 1%".to_string()],
    });
    let images = ImageCopy::new(
        root.join("assets/img"),
        PatternSet::new(root, &["assets/img/**/*.{png,svg}"]).unwrap(),
        root.join("static/img"),
    );
    vec![Arc::new(styles), Arc::new(images)]
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scss_change_reaches_connected_browser() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "assets/sass/main.scss", "$c: #123456;\nbody { color: $c; }\n");

    let broadcaster = Arc::new(ReloadBroadcaster::new());
    let (_client, mut browser) = broadcaster.register_client();

    let (tx, rx) = mpsc::channel(16);
    let coordinator =
        RunCoordinator::new(pipelines(root), broadcaster.clone()).with_output_root(root.join("static"));
    let task = tokio::spawn(coordinator.run(rx));

    tx.send(ChangeEvent::new(
        root.join("assets/sass/main.scss"),
        ChangeKind::Modified,
    ))
    .await
    .unwrap();
    drop(tx);

    let states = task.await.unwrap();
    let message = browser.recv().await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&message).unwrap();

    assert_eq!(json["type"], "reload");
    assert_eq!(json["pipeline"], "styles");
    assert_eq!(json["scope"], "css");
    assert_eq!(json["files"][0], "css/main.css");

    let css = std::fs::read_to_string(root.join("static/css/main.css")).unwrap();
    assert!(css.contains("body{color:#123456}"), "unexpected css: {css}");

    let images = states.iter().find(|(name, _)| name == "images").unwrap();
    assert_eq!(images.1.runs_started(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_broken_scss_keeps_output_and_sends_nothing() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "assets/sass/main.scss", "body {\n  color: red;\n");
    write(root, "static/css/main.css", "body{color:blue}");

    let broadcaster = Arc::new(ReloadBroadcaster::new());
    let (_client, mut browser) = broadcaster.register_client();

    let (tx, rx) = mpsc::channel(16);
    let mut coordinator = RunCoordinator::new(pipelines(root), broadcaster.clone());
    let mut observed = coordinator.subscribe();
    let task = tokio::spawn(coordinator.run(rx));

    tx.send(ChangeEvent::new(
        root.join("assets/sass/main.scss"),
        ChangeKind::Modified,
    ))
    .await
    .unwrap();
    drop(tx);
    task.await.unwrap();

    assert!(browser.try_recv().is_err());
    assert_eq!(
        std::fs::read_to_string(root.join("static/css/main.css")).unwrap(),
        "body{color:blue}"
    );

    let mut failed = false;
    while let Ok(event) = observed.try_recv() {
        if let CoordinatorEvent::RunFinished { result: Err(failure), .. } = event {
            failed = failure.error.is_input();
        }
    }
    assert!(failed);
}
