//! Per-pipeline single-flight state machine.

use std::fmt;

/// Execution status of one pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    /// Running, and at least one change arrived since the run started
    PendingRerun,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Idle => write!(f, "idle"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::PendingRerun => write!(f, "pending rerun"),
        }
    }
}

/// How the last completed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    Failed,
}

/// What the coordinator must do in response to a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OnChange {
    /// Start a run now
    Start,
    /// A run is in flight; a rerun is now queued
    Queued,
    /// A rerun was already queued
    Absorbed,
}

/// State of one pipeline. Owned and mutated only by the coordinator task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    status: RunStatus,
    runs_started: u64,
    last_outcome: Option<RunOutcome>,
    /// The current run hit the timeout and is still draining
    timed_out: bool,
}

impl RunState {
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Number of runs started so far, reruns included.
    pub fn runs_started(&self) -> u64 {
        self.runs_started
    }

    pub fn last_outcome(&self) -> Option<RunOutcome> {
        self.last_outcome
    }

    pub fn is_busy(&self) -> bool {
        self.status != RunStatus::Idle
    }

    /// Whether the current run already timed out and is only draining.
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Record that the current run exceeded its timeout.
    ///
    /// The run still counts as in flight: changes keep queueing a rerun, which
    /// starts only once the abandoned run has finished.
    pub(crate) fn on_timeout(&mut self) {
        if self.is_busy() {
            self.timed_out = true;
            self.last_outcome = Some(RunOutcome::Failed);
        }
    }

    pub(crate) fn on_change(&mut self) -> OnChange {
        match self.status {
            RunStatus::Idle => {
                self.begin();
                OnChange::Start
            }
            RunStatus::Running => {
                self.status = RunStatus::PendingRerun;
                OnChange::Queued
            }
            RunStatus::PendingRerun => OnChange::Absorbed,
        }
    }

    /// Record a completed run.
    ///
    /// Returns true when a queued rerun must start now; the state is then
    /// already `Running` again.
    pub(crate) fn on_complete(&mut self, outcome: RunOutcome) -> bool {
        self.last_outcome = Some(outcome);
        self.timed_out = false;
        match self.status {
            RunStatus::PendingRerun => {
                self.begin();
                true
            }
            RunStatus::Running | RunStatus::Idle => {
                self.status = RunStatus::Idle;
                false
            }
        }
    }

    fn begin(&mut self) {
        self.status = RunStatus::Running;
        self.runs_started += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_change_starts_run() {
        let mut state = RunState::default();
        assert_eq!(state.on_change(), OnChange::Start);
        assert_eq!(state.status(), RunStatus::Running);
        assert_eq!(state.runs_started(), 1);
    }

    #[test]
    fn test_changes_while_running_queue_one_rerun() {
        let mut state = RunState::default();
        state.on_change();
        assert_eq!(state.on_change(), OnChange::Queued);
        assert_eq!(state.on_change(), OnChange::Absorbed);
        assert_eq!(state.on_change(), OnChange::Absorbed);
        assert_eq!(state.status(), RunStatus::PendingRerun);

        assert!(state.on_complete(RunOutcome::Succeeded));
        assert_eq!(state.status(), RunStatus::Running);
        assert_eq!(state.runs_started(), 2);

        assert!(!state.on_complete(RunOutcome::Failed));
        assert_eq!(state.status(), RunStatus::Idle);
        assert_eq!(state.last_outcome(), Some(RunOutcome::Failed));
    }

    #[test]
    fn test_timed_out_run_stays_busy_until_drained() {
        let mut state = RunState::default();
        state.on_change();
        state.on_timeout();
        assert!(state.timed_out());
        assert!(state.is_busy());
        assert_eq!(state.last_outcome(), Some(RunOutcome::Failed));

        // A change while draining queues, it does not start a second run
        assert_eq!(state.on_change(), OnChange::Queued);
        assert_eq!(state.runs_started(), 1);

        assert!(state.on_complete(RunOutcome::Failed));
        assert!(!state.timed_out());
        assert_eq!(state.runs_started(), 2);
    }

    #[test]
    fn test_failure_still_runs_pending_rerun() {
        let mut state = RunState::default();
        state.on_change();
        state.on_change();
        assert!(state.on_complete(RunOutcome::Failed));
        assert!(state.is_busy());
    }
}
