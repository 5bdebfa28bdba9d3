use rusqlite::Connection;

use crate::db::{connection, event_repo, task_repo};
use crate::error::{ErrorCode, TaskboardError};
use crate::models::{CompletionSnapshot, ProjectEvent, StoredEvent, Task, TaskStatus};
use crate::workflow::completion;
use crate::workflow::guard::{self, Decision};

/// Result of an accepted status request.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub task: Task,
    pub previous_status: TaskStatus,
    /// `false` when the request was a no-op.
    pub changed: bool,
    pub completion: CompletionSnapshot,
    pub events: Vec<StoredEvent>,
}

/// Anything that can commit a guarded status change.
pub trait StatusBackend {
    fn update_status(
        &mut self,
        task_id: &str,
        requested: TaskStatus,
        confirm: bool,
    ) -> Result<StatusUpdate, TaskboardError>;
}

impl StatusBackend for &Connection {
    fn update_status(
        &mut self,
        task_id: &str,
        requested: TaskStatus,
        confirm: bool,
    ) -> Result<StatusUpdate, TaskboardError> {
        update_task_status(*self, task_id, requested, confirm)
    }
}

/// Guarded status change for one task.
///
/// The guard runs against the row as read inside a `BEGIN IMMEDIATE`
/// transaction, so two writers racing to confirm `Done` are serialized and
/// the second one sees the lock. Completion is recomputed and events are
/// appended in the same transaction.
pub fn update_task_status(
    conn: &Connection,
    task_id: &str,
    requested: TaskStatus,
    confirm: bool,
) -> Result<StatusUpdate, TaskboardError> {
    let result = connection::with_immediate_tx(conn, |conn| apply(conn, task_id, requested, confirm));

    match result {
        Ok(ref update) if update.changed => tracing::info!(
            task_id,
            from = update.previous_status.as_str(),
            to = update.task.status.as_str(),
            completion = update.completion.completion_percentage,
            "task status updated"
        ),
        Ok(_) => tracing::debug!(task_id, status = requested.as_str(), "status unchanged"),
        Err(ref e) => match e.code {
            ErrorCode::RequiresConfirmation => {
                tracing::debug!(task_id, "done transition awaiting confirmation")
            }
            ErrorCode::StatusLocked => {
                tracing::warn!(task_id, requested = requested.as_str(), "rejected change to locked task")
            }
            ErrorCode::TaskNotFound => tracing::warn!(task_id, "status change for missing task"),
            _ => tracing::error!(task_id, error = %e, "status change failed"),
        },
    }
    result
}

fn apply(
    conn: &Connection,
    task_id: &str,
    requested: TaskStatus,
    confirm: bool,
) -> Result<StatusUpdate, TaskboardError> {
    let task = task_repo::get_task_by_id(conn, task_id)?;
    let previous_status = task.status;

    let (status, confirmed) = match guard::check(&task, requested, confirm)? {
        Decision::NoOp => {
            let completion = project_completion(conn, &task.project_id)?;
            return Ok(StatusUpdate {
                task,
                previous_status,
                changed: false,
                completion,
                events: Vec::new(),
            });
        }
        Decision::Apply { status, confirmed } => (status, confirmed),
    };

    if !task_repo::set_status(conn, &task.id, status, confirmed)? {
        // The row was deleted or locked after it was read.
        return Err(match task_repo::find_task_by_id(conn, &task.id)? {
            Some(current) => TaskboardError::status_locked(&current.id, &current.title),
            None => TaskboardError::task_not_found(&task.id),
        });
    }

    let updated = task_repo::get_task_by_id(conn, &task.id)?;
    let completion = project_completion(conn, &updated.project_id)?;

    let mut events = vec![event_repo::append_event(
        conn,
        &ProjectEvent::ProjectCompletionUpdated {
            project_id: updated.project_id.clone(),
            completion,
        },
    )?];
    if status == TaskStatus::Done && completion.is_fully_completed {
        events.push(event_repo::append_event(
            conn,
            &ProjectEvent::ProjectFullyCompleted {
                project_id: updated.project_id.clone(),
                completion_stats: completion,
            },
        )?);
        tracing::info!(project_id = %updated.project_id, "project fully completed");
    }

    Ok(StatusUpdate {
        task: updated,
        previous_status,
        changed: true,
        completion,
        events,
    })
}

/// Current completion snapshot for a project.
pub fn project_completion(conn: &Connection, project_id: &str) -> Result<CompletionSnapshot, TaskboardError> {
    let tasks = task_repo::list_tasks_by_project(conn, project_id)?;
    Ok(completion::aggregate(&tasks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::project_repo;
    use crate::db::task_repo::NewTask;
    use crate::models::Priority;

    fn setup(task_ids: &[&str]) -> Connection {
        let conn = connection::open_in_memory().unwrap();
        project_repo::create_project(&conn, "P1", "site", "Site", None).unwrap();
        for id in task_ids {
            task_repo::create_task(
                &conn,
                &NewTask {
                    id,
                    project_id: "P1",
                    parent_task_id: None,
                    title: id,
                    description: None,
                    priority: Some(Priority::High),
                    due_date: None,
                },
            )
            .unwrap();
        }
        conn
    }

    #[test]
    fn done_without_confirm_leaves_record_unchanged() {
        let conn = setup(&["T1"]);
        update_task_status(&conn, "T1", TaskStatus::InProgress, false).unwrap();

        let err = update_task_status(&conn, "T1", TaskStatus::Done, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiresConfirmation);

        let stored = task_repo::get_task_by_id(&conn, "T1").unwrap();
        assert_eq!(stored.status, TaskStatus::InProgress);
        assert!(!stored.status_confirmed);
    }

    #[test]
    fn confirmed_done_locks_the_task() {
        let conn = setup(&["T1"]);
        let update = update_task_status(&conn, "T1", TaskStatus::Done, true).unwrap();
        assert!(update.changed);
        assert_eq!(update.previous_status, TaskStatus::ToDo);
        assert_eq!(update.task.status, TaskStatus::Done);
        assert!(update.task.status_confirmed);

        for target in TaskStatus::ALL {
            for confirm in [false, true] {
                let err = update_task_status(&conn, "T1", target, confirm).unwrap_err();
                assert_eq!(err.code, ErrorCode::StatusLocked);
            }
        }
        let stored = task_repo::get_task_by_id(&conn, "T1").unwrap();
        assert_eq!(stored, update.task);
    }

    #[test]
    fn noop_emits_nothing() {
        let conn = setup(&["T1"]);
        let update = update_task_status(&conn, "T1", TaskStatus::ToDo, false).unwrap();
        assert!(!update.changed);
        assert!(update.events.is_empty());
        assert!(event_repo::list_events(&conn, "P1", 0).unwrap().is_empty());
    }

    #[test]
    fn missing_task_is_not_found() {
        let conn = setup(&[]);
        let err = update_task_status(&conn, "nope", TaskStatus::Done, true).unwrap_err();
        assert_eq!(err.code, ErrorCode::TaskNotFound);
    }

    #[test]
    fn completing_last_task_emits_fully_completed() {
        let conn = setup(&["T1", "T2"]);

        let first = update_task_status(&conn, "T1", TaskStatus::Done, true).unwrap();
        assert_eq!(first.completion.completion_percentage, 50.0);
        assert_eq!(first.events.len(), 1);
        assert_eq!(first.events[0].event.kind(), "projectCompletionUpdated");

        let second = update_task_status(&conn, "T2", TaskStatus::Done, true).unwrap();
        assert!(second.completion.is_fully_completed);
        let kinds: Vec<_> = second.events.iter().map(|e| e.event.kind()).collect();
        assert_eq!(kinds, ["projectCompletionUpdated", "projectFullyCompleted"]);

        assert_eq!(event_repo::list_events(&conn, "P1", 0).unwrap().len(), 3);
    }

    #[test]
    fn open_moves_refresh_completion() {
        let conn = setup(&["T1"]);
        let update = update_task_status(&conn, "T1", TaskStatus::InProgress, false).unwrap();
        assert_eq!(update.events.len(), 1);
        assert_eq!(update.completion.completed_tasks, 0);
    }

    #[test]
    fn inconsistent_done_row_is_locked() {
        let conn = setup(&["T1"]);
        conn.execute("UPDATE tasks SET status = 'Done', status_confirmed = 0 WHERE id = 'T1'", [])
            .unwrap();
        let err = update_task_status(&conn, "T1", TaskStatus::ToDo, true).unwrap_err();
        assert_eq!(err.code, ErrorCode::StatusLocked);
    }

    #[test]
    fn concurrent_confirms_lock_in_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.db");
        {
            let conn = connection::init_at(&path).unwrap();
            project_repo::create_project(&conn, "P1", "site", "Site", None).unwrap();
            task_repo::create_task(
                &conn,
                &NewTask {
                    id: "T1",
                    project_id: "P1",
                    parent_task_id: None,
                    title: "race",
                    description: None,
                    priority: None,
                    due_date: None,
                },
            )
            .unwrap();
        }

        let barrier = std::sync::Arc::new(std::sync::Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let path = path.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    let conn = connection::open_at(&path).unwrap();
                    barrier.wait();
                    update_task_status(&conn, "T1", TaskStatus::Done, true).map(|u| u.changed)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let locked_in = results.iter().filter(|r| matches!(r, Ok(true))).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.code == ErrorCode::StatusLocked))
            .count();
        assert_eq!(locked_in, 1, "results: {results:?}");
        assert_eq!(rejected, 1, "results: {results:?}");

        let conn = connection::open_at(&path).unwrap();
        let fully = event_repo::list_events(&conn, "P1", 0)
            .unwrap()
            .into_iter()
            .filter(|e| e.event.kind() == "projectFullyCompleted")
            .count();
        assert_eq!(fully, 1);
    }
}
