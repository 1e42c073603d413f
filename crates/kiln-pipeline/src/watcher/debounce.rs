//! Trailing-edge, per-path debouncing.

use super::{ChangeEvent, ChangeKind};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;

/// Collapses bursts of change events per path.
///
/// Every event for a path restarts that path's window. Once a window elapses
/// without further events the path is released as a single event carrying the
/// most recent kind. Time is passed in explicitly, so the structure is pure.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: HashMap<PathBuf, Pending>,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    kind: ChangeKind,
    last_seen: Instant,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    /// Record `event` as seen at `now`.
    pub fn push(&mut self, event: ChangeEvent, now: Instant) {
        self.pending.insert(
            event.path,
            Pending {
                kind: event.kind,
                last_seen: now,
            },
        );
    }

    /// Earliest instant at which some pending path becomes ready.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .values()
            .map(|pending| pending.last_seen + self.window)
            .min()
    }

    /// Remove and return every path whose window has elapsed at `now`,
    /// oldest first.
    pub fn drain_ready(&mut self, now: Instant) -> Vec<ChangeEvent> {
        let window = self.window;
        let mut ready: Vec<(PathBuf, Pending)> = Vec::new();
        self.pending.retain(|path, pending| {
            if pending.last_seen + window <= now {
                ready.push((path.clone(), *pending));
                false
            } else {
                true
            }
        });
        Self::ordered(ready)
    }

    /// Remove and return everything still pending, oldest first.
    pub fn drain_all(&mut self) -> Vec<ChangeEvent> {
        let all: Vec<(PathBuf, Pending)> = self.pending.drain().collect();
        Self::ordered(all)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn ordered(mut events: Vec<(PathBuf, Pending)>) -> Vec<ChangeEvent> {
        events.sort_by(|a, b| a.1.last_seen.cmp(&b.1.last_seen).then_with(|| a.0.cmp(&b.0)));
        events
            .into_iter()
            .map(|(path, pending)| ChangeEvent {
                path,
                kind: pending.kind,
            })
            .collect()
    }
}
