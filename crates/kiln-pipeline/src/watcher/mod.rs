//! File system change watcher.
//!
//! One notify watcher is registered per watch root so that a missing or
//! unwatchable root only disables itself. The notify callback forwards raw
//! events into a channel; an async task filters them against the declared
//! patterns, debounces them per path and emits [`ChangeEvent`]s.

mod debounce;

pub use debounce::Debouncer;

use crate::error::WatchError;
use crate::patterns::PatternSet;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

const RAW_CHANNEL_CAPACITY: usize = 1024;

/// Kind of file system change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

/// A debounced change to a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Which paths are worth reporting.
#[derive(Debug, Clone)]
struct ChangeFilter {
    patterns: Vec<PatternSet>,
    ignored: Vec<PathBuf>,
}

impl ChangeFilter {
    fn accepts(&self, path: &Path) -> bool {
        if self.ignored.iter().any(|dir| path.starts_with(dir)) {
            return false;
        }

        self.patterns
            .iter()
            .any(|set| !Self::is_hidden(path, set.root()) && set.is_match(path))
    }

    /// Hidden components below `root` (`.git`, `.DS_Store`, editor swap dirs).
    fn is_hidden(path: &Path, root: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        relative.components().any(|component| {
            component
                .as_os_str()
                .to_str()
                .map(|name| name.starts_with('.') && name != "." && name != "..")
                .unwrap_or(false)
        })
    }
}

/// Watches the roots of a set of patterns and emits debounced changes.
///
/// Watching stops when the `ChangeWatcher` is dropped.
pub struct ChangeWatcher {
    watchers: Vec<(PathBuf, RecommendedWatcher)>,
    raw_tx: mpsc::Sender<ChangeEvent>,
    task: JoinHandle<()>,
}

impl ChangeWatcher {
    /// Start a watcher for `patterns` sending into `events`.
    ///
    /// Paths under any of `ignored` (typically the output directory) are never
    /// reported. Must be called from within a tokio runtime.
    ///
    /// # Returns
    ///
    /// The watcher and one error per root that could not be registered.
    pub fn start(
        patterns: Vec<PatternSet>,
        ignored: Vec<PathBuf>,
        debounce: Duration,
        events: mpsc::Sender<ChangeEvent>,
    ) -> (Self, Vec<WatchError>) {
        let roots = union_roots(&patterns);
        let (raw_tx, raw_rx) = mpsc::channel(RAW_CHANNEL_CAPACITY);
        let filter = ChangeFilter { patterns, ignored };
        let task = tokio::spawn(route_changes(raw_rx, filter, Debouncer::new(debounce), events));

        let mut watcher = Self {
            watchers: Vec::new(),
            raw_tx,
            task,
        };

        let errors = roots
            .into_iter()
            .filter_map(|root| watcher.register(&root).err())
            .collect::<Vec<_>>();
        for error in &errors {
            tracing::warn!("{}", error);
        }

        (watcher, errors)
    }

    /// Register one more watch root.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::MissingRoot`] if `root` does not exist and
    /// [`WatchError::Setup`] if it cannot be monitored.
    pub fn register(&mut self, root: &Path) -> Result<(), WatchError> {
        if !root.is_dir() {
            return Err(WatchError::MissingRoot(root.to_path_buf()));
        }

        let tx = self.raw_tx.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for change in classify(&event) {
                    // Receiver gone means the watcher is shutting down.
                    if tx.blocking_send(change).is_err() {
                        return;
                    }
                }
            }
            Err(e) => tracing::warn!("watch error: {}", e),
        })
        .map_err(|source| WatchError::Setup {
            root: root.to_path_buf(),
            source,
        })?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|source| WatchError::Setup {
                root: root.to_path_buf(),
                source,
            })?;

        tracing::debug!(root = %root.display(), "watching");
        self.watchers.push((root.to_path_buf(), watcher));
        Ok(())
    }

    /// Successfully registered roots.
    pub fn roots(&self) -> Vec<&Path> {
        self.watchers.iter().map(|(root, _)| root.as_path()).collect()
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Watch roots of every pattern set, with nested roots folded into parents.
fn union_roots(patterns: &[PatternSet]) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = patterns.iter().flat_map(PatternSet::watch_roots).collect();
    roots.sort();
    roots.dedup();

    let mut folded: Vec<PathBuf> = Vec::new();
    for root in roots {
        if !folded.iter().any(|parent| root.starts_with(parent)) {
            folded.push(root);
        }
    }
    folded
}

/// Translate a notify event into per-path changes.
fn classify(event: &Event) -> Vec<ChangeEvent> {
    let kinds: Vec<ChangeKind> = match event.kind {
        EventKind::Create(_) => vec![ChangeKind::Created],
        EventKind::Remove(_) => vec![ChangeKind::Deleted],
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => vec![ChangeKind::Deleted],
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => vec![ChangeKind::Created],
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            vec![ChangeKind::Deleted, ChangeKind::Created]
        }
        EventKind::Modify(_) => vec![ChangeKind::Modified],
        _ => return Vec::new(),
    };

    event
        .paths
        .iter()
        .enumerate()
        .map(|(i, path)| ChangeEvent {
            path: path.clone(),
            kind: kinds.get(i).copied().unwrap_or(kinds[kinds.len() - 1]),
        })
        .collect()
}

/// Filter and debounce raw changes until either channel closes.
async fn route_changes(
    mut raw: mpsc::Receiver<ChangeEvent>,
    filter: ChangeFilter,
    mut debouncer: Debouncer,
    events: mpsc::Sender<ChangeEvent>,
) {
    loop {
        let deadline = debouncer.next_deadline();
        let idle = Instant::now() + Duration::from_secs(3600);

        tokio::select! {
            raw_change = raw.recv() => match raw_change {
                Some(change) if filter.accepts(&change.path) => {
                    tracing::trace!(path = %change.path.display(), kind = ?change.kind, "raw change");
                    debouncer.push(change, Instant::now());
                }
                Some(_) => {}
                None => {
                    for change in debouncer.drain_all() {
                        if events.send(change).await.is_err() {
                            break;
                        }
                    }
                    return;
                }
            },
            _ = sleep_until(deadline.unwrap_or(idle)), if deadline.is_some() => {
                for change in debouncer.drain_ready(Instant::now()) {
                    tracing::debug!(path = %change.path.display(), kind = ?change.kind, "change");
                    if events.send(change).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
}
