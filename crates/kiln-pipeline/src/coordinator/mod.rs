//! Single-flight run coordination.
//!
//! The [`RunCoordinator`] owns every pipeline together with its [`RunState`]
//! and reacts to three inputs on one task:
//!
//! 1. change events from the watcher, routed to every pipeline whose patterns
//!    match the changed path
//! 2. manual triggers sent through a [`CoordinatorHandle`]
//! 3. completions of spawned runs, reported over an internal channel
//!
//! Because all state lives on that one task, no lock guards it. A pipeline
//! never has two runs in flight; changes that arrive while it runs collapse
//! into exactly one follow-up run.

mod state;

pub use state::{RunOutcome, RunState, RunStatus};

use crate::error::{Failure, PipelineError, Stage};
use crate::pipeline::{Artifact, SharedPipeline};
use crate::reload::{ReloadNotification, ReloadNotifier};
use crate::watcher::ChangeEvent;
use state::OnChange;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Progress reported to observers.
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    /// A run of `pipeline` started
    RunStarted { pipeline: String },
    /// A change arrived while `pipeline` was running; one rerun is queued
    RerunQueued { pipeline: String },
    /// A run of `pipeline` finished
    RunFinished {
        pipeline: String,
        result: Result<Artifact, Arc<Failure>>,
    },
}

/// Cheap handle for triggering runs from outside the coordinator task.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    triggers: mpsc::UnboundedSender<String>,
}

impl CoordinatorHandle {
    /// Start `pipeline` as if a matching change had arrived.
    ///
    /// Returns false once the coordinator has stopped.
    pub fn trigger(&self, pipeline: impl Into<String>) -> bool {
        self.triggers.send(pipeline.into()).is_ok()
    }
}

/// Messages from spawned runs back to the coordinator task.
enum Completion {
    /// The run of pipeline `index` returned
    Finished(usize, Result<Artifact, Failure>),
    /// The run exceeded the timeout. Blocking work cannot be interrupted, so
    /// the run keeps going and still reports `Finished` later.
    TimedOut(usize, Failure),
}

/// Routes change events to pipelines and enforces single-flight execution.
pub struct RunCoordinator {
    pipelines: Vec<SharedPipeline>,
    states: Vec<RunState>,
    notifier: Arc<dyn ReloadNotifier>,
    output_root: Option<PathBuf>,
    run_timeout: Option<Duration>,
    observer: Option<mpsc::UnboundedSender<CoordinatorEvent>>,
    trigger_tx: mpsc::UnboundedSender<String>,
    trigger_rx: mpsc::UnboundedReceiver<String>,
}

impl RunCoordinator {
    /// Create a coordinator with every pipeline idle.
    pub fn new(pipelines: Vec<SharedPipeline>, notifier: Arc<dyn ReloadNotifier>) -> Self {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let states = vec![RunState::default(); pipelines.len()];
        Self {
            pipelines,
            states,
            notifier,
            output_root: None,
            run_timeout: None,
            observer: None,
            trigger_tx,
            trigger_rx,
        }
    }

    /// Report notification paths relative to `root` instead of each
    /// pipeline's own output directory.
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = Some(root.into());
        self
    }

    /// Fail runs that take longer than `timeout`.
    pub fn with_run_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Receive [`CoordinatorEvent`]s. Replaces any earlier subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<CoordinatorEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observer = Some(tx);
        rx
    }

    pub fn handle(&self) -> CoordinatorHandle {
        CoordinatorHandle {
            triggers: self.trigger_tx.clone(),
        }
    }

    /// Process events until `changes` closes and no run is in flight.
    ///
    /// # Returns
    ///
    /// The final state of every pipeline, in registration order
    pub async fn run(mut self, mut changes: mpsc::Receiver<ChangeEvent>) -> Vec<(String, RunState)> {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();
        let (_, placeholder) = mpsc::unbounded_channel();
        let mut triggers = std::mem::replace(&mut self.trigger_rx, placeholder);
        let mut changes_open = true;

        loop {
            if !changes_open && !self.states.iter().any(RunState::is_busy) {
                break;
            }

            tokio::select! {
                biased;

                Some(completion) = done_rx.recv() => match completion {
                    Completion::Finished(index, result) => {
                        self.complete(index, result, &done_tx).await;
                    }
                    Completion::TimedOut(index, failure) => self.time_out(index, failure),
                },
                Some(name) = triggers.recv() => {
                    match self.pipelines.iter().position(|p| p.name() == name) {
                        Some(index) => self.on_change(index, &done_tx),
                        None => tracing::warn!(pipeline = %name, "trigger for unknown pipeline"),
                    }
                }
                change = changes.recv(), if changes_open => match change {
                    Some(change) => self.route(&change, &done_tx),
                    None => changes_open = false,
                },
                else => break,
            }
        }

        self.pipelines
            .iter()
            .map(|p| p.name().to_string())
            .zip(self.states)
            .collect()
    }

    fn route(&mut self, change: &ChangeEvent, done_tx: &mpsc::UnboundedSender<Completion>) {
        let matching: Vec<usize> = self
            .pipelines
            .iter()
            .enumerate()
            .filter(|(_, pipeline)| pipeline.input_patterns().is_match(&change.path))
            .map(|(index, _)| index)
            .collect();

        if matching.is_empty() {
            tracing::trace!(path = %change.path.display(), "change matched no pipeline");
        }
        for index in matching {
            tracing::debug!(
                pipeline = self.pipelines[index].name(),
                path = %change.path.display(),
                kind = ?change.kind,
                "change routed"
            );
            self.on_change(index, done_tx);
        }
    }

    fn on_change(&mut self, index: usize, done_tx: &mpsc::UnboundedSender<Completion>) {
        let name = self.pipelines[index].name().to_string();
        match self.states[index].on_change() {
            OnChange::Start => self.spawn_run(index, done_tx),
            OnChange::Queued => {
                tracing::debug!(pipeline = %name, "rerun queued");
                self.emit(CoordinatorEvent::RerunQueued { pipeline: name });
            }
            OnChange::Absorbed => {}
        }
    }

    fn spawn_run(&mut self, index: usize, done_tx: &mpsc::UnboundedSender<Completion>) {
        let pipeline = Arc::clone(&self.pipelines[index]);
        let name = pipeline.name().to_string();
        let timeout = self.run_timeout;
        let done_tx = done_tx.clone();

        tracing::debug!(pipeline = %name, run = self.states[index].runs_started(), "run started");
        self.emit(CoordinatorEvent::RunStarted {
            pipeline: name.clone(),
        });

        tokio::spawn(async move {
            let mut run = tokio::spawn(async move { pipeline.run().await });

            let joined = match timeout {
                Some(limit) => match tokio::time::timeout(limit, &mut run).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        let failure = Failure::new(
                            &name,
                            Stage::Transform,
                            PipelineError::transform(format!(
                                "run timed out after {}ms",
                                limit.as_millis()
                            )),
                        );
                        let _ = done_tx.send(Completion::TimedOut(index, failure));
                        run.await
                    }
                },
                None => run.await,
            };

            let result = joined.unwrap_or_else(|e| {
                Err(Failure::new(
                    &name,
                    Stage::Transform,
                    PipelineError::transform(format!("run aborted: {}", e)),
                ))
            });
            let _ = done_tx.send(Completion::Finished(index, result));
        });
    }

    /// Surface a timeout now; the pipeline stays busy until the run drains.
    fn time_out(&mut self, index: usize, failure: Failure) {
        let name = self.pipelines[index].name().to_string();
        tracing::error!(pipeline = %name, stage = %failure.stage, "{}", failure.error);
        self.states[index].on_timeout();
        self.emit(CoordinatorEvent::RunFinished {
            pipeline: name,
            result: Err(Arc::new(failure)),
        });
    }

    async fn complete(
        &mut self,
        index: usize,
        result: Result<Artifact, Failure>,
        done_tx: &mpsc::UnboundedSender<Completion>,
    ) {
        let pipeline = Arc::clone(&self.pipelines[index]);
        let name = pipeline.name().to_string();

        if self.states[index].timed_out() {
            tracing::warn!(
                pipeline = %name,
                succeeded = result.is_ok(),
                "timed-out run finished; result ignored"
            );
            if self.states[index].on_complete(RunOutcome::Failed) {
                self.spawn_run(index, done_tx);
            }
            return;
        }

        let (outcome, result) = match result {
            Ok(artifact) => {
                tracing::info!(
                    pipeline = %name,
                    files = artifact.files.len(),
                    bytes = artifact.bytes,
                    duration_ms = artifact.duration.as_millis() as u64,
                    "run succeeded"
                );

                let root = self
                    .output_root
                    .clone()
                    .unwrap_or_else(|| pipeline.output_path().to_path_buf());
                let notification = ReloadNotification {
                    pipeline: name.clone(),
                    scope: pipeline.reload_scope(),
                    files: artifact.files_relative_to(&root),
                };
                // Awaited so notifications keep completion order
                self.notifier.notify(notification).await;

                (RunOutcome::Succeeded, Ok(artifact))
            }
            Err(failure) => {
                tracing::error!(pipeline = %name, stage = %failure.stage, "{}", failure.error);
                (RunOutcome::Failed, Err(Arc::new(failure)))
            }
        };

        self.emit(CoordinatorEvent::RunFinished {
            pipeline: name,
            result,
        });

        if self.states[index].on_complete(outcome) {
            self.spawn_run(index, done_tx);
        }
    }

    fn emit(&self, event: CoordinatorEvent) {
        if let Some(observer) = &self.observer {
            let _ = observer.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternSet;
    use crate::pipeline::{run_blocking, Pipeline};
    use crate::reload::{ReloadBroadcaster, ReloadScope};
    use crate::watcher::ChangeKind;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    struct FakePipeline {
        name: &'static str,
        patterns: PatternSet,
        out: PathBuf,
        delay: Duration,
        fail: bool,
        scope: ReloadScope,
        runs: Mutex<Vec<(Instant, Instant)>>,
    }

    impl FakePipeline {
        fn new(name: &'static str, patterns: &[&str], delay_ms: u64) -> Self {
            Self {
                name,
                patterns: PatternSet::new("/project", patterns).unwrap(),
                out: PathBuf::from("/project/static/css"),
                delay: Duration::from_millis(delay_ms),
                fail: false,
                scope: ReloadScope::Css,
                runs: Mutex::new(Vec::new()),
            }
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        fn run_count(&self) -> usize {
            self.runs.lock().len()
        }
    }

    #[async_trait]
    impl Pipeline for FakePipeline {
        fn name(&self) -> &str {
            self.name
        }

        fn input_patterns(&self) -> &PatternSet {
            &self.patterns
        }

        fn output_path(&self) -> &Path {
            &self.out
        }

        fn reload_scope(&self) -> ReloadScope {
            self.scope
        }

        async fn run(&self) -> Result<Artifact, Failure> {
            let start = Instant::now();
            tokio::time::sleep(self.delay).await;
            self.runs.lock().push((start, Instant::now()));

            if self.fail {
                return Err(Failure::new(
                    self.name,
                    Stage::Transform,
                    PipelineError::Input {
                        file: PathBuf::from("a.scss"),
                        line: Some(1),
                        column: Some(1),
                        message: "broken".to_string(),
                    },
                ));
            }
            Ok(Artifact {
                pipeline: self.name.to_string(),
                files: vec![self.out.join("main.css")],
                bytes: 10,
                duration: self.delay,
            })
        }
    }

    #[derive(Default)]
    struct Recorder {
        notifications: Mutex<Vec<ReloadNotification>>,
    }

    #[async_trait]
    impl ReloadNotifier for Recorder {
        async fn notify(&self, notification: ReloadNotification) {
            self.notifications.lock().push(notification);
        }
    }

    fn change(path: &str) -> ChangeEvent {
        ChangeEvent::new(path, ChangeKind::Modified)
    }

    async fn drive(
        pipelines: Vec<SharedPipeline>,
        recorder: Arc<Recorder>,
        events: Vec<ChangeEvent>,
    ) -> (Vec<(String, RunState)>, Vec<CoordinatorEvent>) {
        let (tx, rx) = mpsc::channel(256);
        let mut coordinator = RunCoordinator::new(pipelines, recorder);
        let mut observed = coordinator.subscribe();

        for event in events {
            tx.send(event).await.unwrap();
        }
        drop(tx);

        let states = coordinator.run(rx).await;
        let mut seen = Vec::new();
        while let Ok(event) = observed.try_recv() {
            seen.push(event);
        }
        (states, seen)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_during_run_causes_exactly_one_rerun() {
        let fake = Arc::new(FakePipeline::new("styles", &["*.scss"], 100));
        let recorder = Arc::new(Recorder::default());
        let events = (0..10).map(|_| change("/project/a.scss")).collect();

        let (states, _) = drive(vec![fake.clone()], recorder.clone(), events).await;

        assert_eq!(fake.run_count(), 2);
        assert_eq!(states[0].1.runs_started(), 2);
        assert_eq!(states[0].1.status(), RunStatus::Idle);
        assert_eq!(recorder.notifications.lock().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_never_overlap() {
        let fake = Arc::new(FakePipeline::new("styles", &["*.scss"], 50));
        let recorder = Arc::new(Recorder::default());
        let (tx, rx) = mpsc::channel(256);
        let task = tokio::spawn(RunCoordinator::new(vec![fake.clone()], recorder).run(rx));

        for i in 0..20 {
            tx.send(change(&format!("/project/{}.scss", i % 3))).await.unwrap();
            tokio::time::sleep(Duration::from_millis(15)).await;
        }
        drop(tx);
        task.await.unwrap();

        let runs = fake.runs.lock().clone();
        assert!(runs.len() >= 2);
        for pair in runs.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "runs overlapped: {:?}", pair);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_emits_no_reload() {
        let fake = Arc::new(FakePipeline::new("styles", &["*.scss"], 10).failing());
        let recorder = Arc::new(Recorder::default());

        let (states, seen) =
            drive(vec![fake.clone()], recorder.clone(), vec![change("/project/a.scss")]).await;

        assert_eq!(fake.run_count(), 1);
        assert!(recorder.notifications.lock().is_empty());
        assert_eq!(states[0].1.last_outcome(), Some(RunOutcome::Failed));
        assert!(seen.iter().any(|event| matches!(
            event,
            CoordinatorEvent::RunFinished { result: Err(failure), .. } if failure.error.is_input()
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_route_only_to_matching_pipelines() {
        let styles = Arc::new(FakePipeline::new("styles", &["*.scss"], 10));
        let scripts = Arc::new(FakePipeline::new("scripts", &["app/**/*.js"], 10));
        let recorder = Arc::new(Recorder::default());

        drive(
            vec![styles.clone(), scripts.clone()],
            recorder,
            vec![change("/project/assets/sass/a.scss"), change("/project/README.md")],
        )
        .await;

        assert_eq!(styles.run_count(), 1);
        assert_eq!(scripts.run_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_event_may_start_several_pipelines() {
        let markup = Arc::new(FakePipeline::new("markup", &["assets/**/*.html"], 10));
        let everything = Arc::new(FakePipeline::new("everything", &["assets/**"], 10));
        let recorder = Arc::new(Recorder::default());

        drive(
            vec![markup.clone(), everything.clone()],
            recorder,
            vec![change("/project/assets/index.html")],
        )
        .await;

        assert_eq!(markup.run_count(), 1);
        assert_eq!(everything.run_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_styles_success_notifies_css_scope() {
        let fake = Arc::new(FakePipeline::new("styles", &["*.scss"], 10));
        let recorder = Arc::new(Recorder::default());

        let (_, seen) = drive(vec![fake], recorder.clone(), vec![change("/project/a.scss")]).await;

        let notifications = recorder.notifications.lock().clone();
        assert_eq!(
            notifications,
            vec![ReloadNotification {
                pipeline: "styles".to_string(),
                scope: ReloadScope::Css,
                files: vec![PathBuf::from("main.css")],
            }]
        );
        assert!(matches!(&seen[0], CoordinatorEvent::RunStarted { pipeline } if pipeline == "styles"));
        assert!(matches!(&seen[1], CoordinatorEvent::RunFinished { result: Ok(_), .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_while_running_reruns_without_trigger() {
        let fake = Arc::new(FakePipeline::new("styles", &["*.scss"], 100));
        let recorder = Arc::new(Recorder::default());

        let (_, seen) = drive(
            vec![fake.clone()],
            recorder,
            vec![change("/project/a.scss"), change("/project/b.scss")],
        )
        .await;

        let kinds: Vec<&str> = seen
            .iter()
            .map(|event| match event {
                CoordinatorEvent::RunStarted { .. } => "started",
                CoordinatorEvent::RerunQueued { .. } => "queued",
                CoordinatorEvent::RunFinished { .. } => "finished",
            })
            .collect();
        assert_eq!(kinds, vec!["started", "queued", "finished", "started", "finished"]);
        assert_eq!(fake.run_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_starts_named_pipeline() {
        let fake = Arc::new(FakePipeline::new("images", &["assets/img/**/*.png"], 10));
        let recorder = Arc::new(Recorder::default());
        let (tx, rx) = mpsc::channel(1);

        let coordinator = RunCoordinator::new(vec![fake.clone()], recorder.clone())
            .with_output_root("/project/static");
        let handle = coordinator.handle();
        let task = tokio::spawn(coordinator.run(rx));

        assert!(handle.trigger("images"));
        assert!(handle.trigger("unknown"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(tx);
        task.await.unwrap();

        assert_eq!(fake.run_count(), 1);
        assert_eq!(
            recorder.notifications.lock()[0].files,
            vec![PathBuf::from("css/main.css")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_timeout_resolves_as_transform_failure() {
        let fake = Arc::new(FakePipeline::new("scripts", &["app/**/*.js"], 5_000));
        let recorder = Arc::new(Recorder::default());
        let (tx, rx) = mpsc::channel(8);

        let mut coordinator = RunCoordinator::new(vec![fake], recorder.clone())
            .with_run_timeout(Some(Duration::from_millis(200)));
        let mut observed = coordinator.subscribe();
        tx.send(change("/project/app/index.js")).await.unwrap();
        drop(tx);

        let states = coordinator.run(rx).await;
        assert_eq!(states[0].1.last_outcome(), Some(RunOutcome::Failed));
        assert!(recorder.notifications.lock().is_empty());

        let mut timed_out = false;
        while let Ok(event) = observed.try_recv() {
            if let CoordinatorEvent::RunFinished { result: Err(failure), .. } = event {
                timed_out = failure.stage == Stage::Transform
                    && failure.error.to_string().contains("timed out");
            }
        }
        assert!(timed_out);
    }

    /// Does its work on the blocking pool and tracks how many bodies overlap.
    struct BlockingWork {
        patterns: PatternSet,
        out: PathBuf,
        work: Duration,
        active: Arc<AtomicUsize>,
        max_active: Arc<AtomicUsize>,
        bodies: Arc<AtomicUsize>,
    }

    impl BlockingWork {
        fn new(work_ms: u64) -> Self {
            Self {
                patterns: PatternSet::new("/project", &["app/**/*.js"]).unwrap(),
                out: PathBuf::from("/project/static/js"),
                work: Duration::from_millis(work_ms),
                active: Arc::new(AtomicUsize::new(0)),
                max_active: Arc::new(AtomicUsize::new(0)),
                bodies: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl Pipeline for BlockingWork {
        fn name(&self) -> &str {
            "scripts"
        }

        fn input_patterns(&self) -> &PatternSet {
            &self.patterns
        }

        fn output_path(&self) -> &Path {
            &self.out
        }

        fn reload_scope(&self) -> ReloadScope {
            ReloadScope::Full
        }

        async fn run(&self) -> Result<Artifact, Failure> {
            let work = self.work;
            let active = Arc::clone(&self.active);
            let max_active = Arc::clone(&self.max_active);
            let bodies = Arc::clone(&self.bodies);

            run_blocking("scripts", move || {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(work);
                active.fetch_sub(1, Ordering::SeqCst);
                bodies.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await?;

            Ok(Artifact {
                pipeline: "scripts".to_string(),
                files: vec![self.out.join("bundle.js")],
                bytes: 1,
                duration: work,
            })
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timed_out_blocking_run_is_not_overlapped() {
        let pipeline = Arc::new(BlockingWork::new(400));
        let recorder = Arc::new(Recorder::default());
        let (tx, rx) = mpsc::channel(8);

        let mut coordinator = RunCoordinator::new(vec![pipeline.clone()], recorder.clone())
            .with_run_timeout(Some(Duration::from_millis(100)));
        let mut observed = coordinator.subscribe();
        let task = tokio::spawn(coordinator.run(rx));

        tx.send(change("/project/app/index.js")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        tx.send(change("/project/app/util.js")).await.unwrap();
        drop(tx);
        let states = task.await.unwrap();

        assert_eq!(pipeline.max_active.load(Ordering::SeqCst), 1);
        assert_eq!(pipeline.bodies.load(Ordering::SeqCst), 2);
        assert_eq!(states[0].1.runs_started(), 2);
        assert_eq!(states[0].1.status(), RunStatus::Idle);
        assert!(recorder.notifications.lock().is_empty());

        let mut timeouts = 0;
        while let Ok(event) = observed.try_recv() {
            if let CoordinatorEvent::RunFinished { result: Err(failure), .. } = event {
                assert!(failure.error.to_string().contains("timed out"));
                timeouts += 1;
            }
        }
        assert_eq!(timeouts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_browser_does_not_block_other_pipelines() {
        let markup = Arc::new(FakePipeline::new("markup", &["assets/**/*.html"], 1));
        let images = Arc::new(FakePipeline::new("images", &["assets/img/**/*.png"], 1));
        let broadcaster = Arc::new(ReloadBroadcaster::with_buffer(4));
        let (_id, _never_read) = broadcaster.register_client();

        let (tx, rx) = mpsc::channel(256);
        let coordinator =
            RunCoordinator::new(vec![markup.clone(), images.clone()], broadcaster.clone());
        let task = tokio::spawn(coordinator.run(rx));

        for _ in 0..10 {
            tx.send(change("/project/assets/index.html")).await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tx.send(change("/project/assets/img/logo.png")).await.unwrap();
        drop(tx);
        task.await.unwrap();

        assert_eq!(markup.run_count(), 10);
        assert_eq!(images.run_count(), 1);
        assert_eq!(broadcaster.client_count(), 0);
    }
}
