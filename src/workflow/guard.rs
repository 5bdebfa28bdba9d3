//! Status transition guard.
//!
//! Decides what a requested status change does before anything is written.
//! `Done` is one-way: entering it needs an explicit confirmation, and once a
//! task is `Done` its status never changes again.

use crate::error::TaskboardError;
use crate::models::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Requested status equals the current one.
    NoOp,
    /// Persist `status` and `confirmed`.
    Apply { status: TaskStatus, confirmed: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Moving into `Done` must be re-requested with the confirm flag.
    RequiresConfirmation,
    /// The task is locked in `Done`.
    StatusLocked,
}

pub fn evaluate(
    current: TaskStatus,
    // A Done row is locked whether or not its confirmation flag was recorded.
    _current_confirmed: bool,
    requested: TaskStatus,
    confirm: bool,
) -> Result<Decision, Rejection> {
    match (current, requested) {
        // Includes Done -> Done: a second confirmation must not look like a success.
        (TaskStatus::Done, _) => Err(Rejection::StatusLocked),
        (from, to) if from == to => Ok(Decision::NoOp),
        (_, TaskStatus::Done) if !confirm => Err(Rejection::RequiresConfirmation),
        (_, TaskStatus::Done) => Ok(Decision::Apply {
            status: TaskStatus::Done,
            confirmed: true,
        }),
        (_, to) => Ok(Decision::Apply {
            status: to,
            confirmed: false,
        }),
    }
}

/// Evaluate against a loaded task, mapping rejections to reportable errors.
pub fn check(task: &Task, requested: TaskStatus, confirm: bool) -> Result<Decision, TaskboardError> {
    evaluate(task.status, task.status_confirmed, requested, confirm).map_err(|rejection| match rejection {
        Rejection::RequiresConfirmation => TaskboardError::requires_confirmation(&task.id, &task.title),
        Rejection::StatusLocked => TaskboardError::status_locked(&task.id, &task.title),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use TaskStatus::{Done, InProgress, ToDo};

    #[test]
    fn same_status_is_noop() {
        for confirm in [false, true] {
            assert_eq!(evaluate(ToDo, false, ToDo, confirm), Ok(Decision::NoOp));
            assert_eq!(evaluate(InProgress, false, InProgress, confirm), Ok(Decision::NoOp));
        }
    }

    #[test]
    fn open_statuses_move_freely() {
        assert_eq!(
            evaluate(ToDo, false, InProgress, false),
            Ok(Decision::Apply { status: InProgress, confirmed: false })
        );
        assert_eq!(
            evaluate(InProgress, false, ToDo, true),
            Ok(Decision::Apply { status: ToDo, confirmed: false })
        );
    }

    #[test]
    fn done_requires_confirmation() {
        assert_eq!(evaluate(ToDo, false, Done, false), Err(Rejection::RequiresConfirmation));
        assert_eq!(evaluate(InProgress, false, Done, false), Err(Rejection::RequiresConfirmation));
    }

    #[test]
    fn confirmed_done_locks() {
        let locked = Decision::Apply { status: Done, confirmed: true };
        assert_eq!(evaluate(ToDo, false, Done, true), Ok(locked));
        assert_eq!(evaluate(InProgress, false, Done, true), Ok(locked));
    }

    #[test]
    fn done_is_terminal() {
        for confirm in [false, true] {
            assert_eq!(evaluate(Done, true, ToDo, confirm), Err(Rejection::StatusLocked));
            assert_eq!(evaluate(Done, true, InProgress, confirm), Err(Rejection::StatusLocked));
        }
    }

    #[test]
    fn unconfirmed_done_is_treated_as_locked() {
        assert_eq!(evaluate(Done, false, ToDo, true), Err(Rejection::StatusLocked));
        assert_eq!(evaluate(Done, false, InProgress, false), Err(Rejection::StatusLocked));
        assert_eq!(evaluate(Done, false, Done, false), Err(Rejection::StatusLocked));
    }

    #[test]
    fn repeated_done_is_rejected() {
        assert_eq!(evaluate(Done, true, Done, false), Err(Rejection::StatusLocked));
        assert_eq!(evaluate(Done, true, Done, true), Err(Rejection::StatusLocked));
    }
}
