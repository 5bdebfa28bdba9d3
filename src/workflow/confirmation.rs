//! Human-in-the-loop step between "move to Done" and the committed lock-in.
//!
//! Nothing is written while a transition is awaiting confirmation; views keep
//! showing the task's current status until [`ConfirmationFlow::confirm`]
//! commits it.

use crate::error::TaskboardError;
use crate::models::{Task, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransition {
    pub task_id: String,
    pub title: String,
    pub from: TaskStatus,
    pub requested: TaskStatus,
}

impl PendingTransition {
    pub fn prompt(&self) -> String {
        format!(
            "Mark '{}' as {}? Its status will be locked and cannot be changed afterwards.",
            self.title,
            self.requested.as_str()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfirmationState {
    #[default]
    Idle,
    AwaitingConfirmation(PendingTransition),
}

#[derive(Debug, Default)]
pub struct ConfirmationFlow {
    state: ConfirmationState,
}

impl ConfirmationFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ConfirmationState {
        &self.state
    }

    pub fn pending(&self) -> Option<&PendingTransition> {
        match self.state {
            ConfirmationState::AwaitingConfirmation(ref pending) => Some(pending),
            ConfirmationState::Idle => None,
        }
    }

    pub fn is_pending_for(&self, task_id: &str) -> bool {
        self.pending().is_some_and(|p| p.task_id == task_id)
    }

    /// Enter AwaitingConfirmation. A previous pending request is replaced.
    pub fn request(&mut self, task: &Task, requested: TaskStatus) -> PendingTransition {
        if let Some(previous) = self.pending() {
            tracing::debug!(task_id = %previous.task_id, "replacing pending confirmation");
        }
        let pending = PendingTransition {
            task_id: task.id.clone(),
            title: task.title.clone(),
            from: task.status,
            requested,
        };
        self.state = ConfirmationState::AwaitingConfirmation(pending.clone());
        pending
    }

    /// Discard the pending request without touching the store.
    pub fn cancel(&mut self) -> Option<PendingTransition> {
        match std::mem::take(&mut self.state) {
            ConfirmationState::AwaitingConfirmation(pending) => {
                tracing::debug!(task_id = %pending.task_id, "confirmation cancelled");
                Some(pending)
            }
            ConfirmationState::Idle => None,
        }
    }

    /// Commit the pending request through `commit`, which must issue the
    /// guarded transition with the confirm flag set. Returns to Idle whether or
    /// not the commit succeeds; `Ok(None)` when nothing was pending.
    pub fn confirm<T, F>(&mut self, commit: F) -> Result<Option<T>, TaskboardError>
    where
        F: FnOnce(&PendingTransition) -> Result<T, TaskboardError>,
    {
        match std::mem::take(&mut self.state) {
            ConfirmationState::AwaitingConfirmation(pending) => commit(&pending).map(Some),
            ConfirmationState::Idle => Ok(None),
        }
    }
}
