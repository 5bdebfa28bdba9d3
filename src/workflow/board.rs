//! Kanban projection of a task set and the drag-relocation contract.

use crate::error::{ErrorCode, TaskboardError};
use crate::models::{priority_rank, CompletionSnapshot, Task, TaskStatus};
use crate::workflow::completion;
use crate::workflow::confirmation::{ConfirmationFlow, PendingTransition};
use crate::workflow::status::{StatusBackend, StatusUpdate};

/// Tasks grouped by status, each bucket ordered by priority.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    pub todo: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub done: Vec<Task>,
}

impl Board {
    pub fn bucket(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::ToDo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Done => &self.done,
        }
    }

    pub fn columns(&self) -> [(TaskStatus, &[Task]); 3] {
        TaskStatus::ALL.map(|status| (status, self.bucket(status)))
    }

    pub fn bucket_of(&self, task_id: &str) -> Option<TaskStatus> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| self.bucket(*status).iter().any(|t| t.id == task_id))
    }
}

/// Group and sort. Stable: equal priorities keep input order; a missing
/// priority sorts after `Low`.
pub fn project(tasks: &[Task]) -> Board {
    let mut board = Board::default();
    for task in tasks {
        match task.status {
            TaskStatus::ToDo => board.todo.push(task.clone()),
            TaskStatus::InProgress => board.in_progress.push(task.clone()),
            TaskStatus::Done => board.done.push(task.clone()),
        }
    }
    for bucket in [&mut board.todo, &mut board.in_progress, &mut board.done] {
        bucket.sort_by_key(|t| priority_rank(t.priority));
    }
    board
}

/// A card dropped from one bucket onto another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveEvent {
    pub task_id: String,
    pub from: TaskStatus,
    pub to: TaskStatus,
}

#[derive(Debug)]
pub enum MoveOutcome {
    /// Dropped on its own bucket.
    NoOp,
    /// Accepted and persisted; the card is in its new bucket.
    Moved(StatusUpdate),
    /// Card stays put until the pending confirmation resolves.
    AwaitingConfirmation(PendingTransition),
    /// Card reverted; the task is locked.
    Rejected(TaskboardError),
}

/// A rendered board bound to the store that owns its tasks.
pub struct BoardSession<B: StatusBackend> {
    backend: B,
    tasks: Vec<Task>,
    board: Board,
    completion: CompletionSnapshot,
    confirmation: ConfirmationFlow,
}

impl<B: StatusBackend> BoardSession<B> {
    pub fn new(backend: B, tasks: Vec<Task>) -> Self {
        let board = project(&tasks);
        let completion = completion::aggregate(&tasks);
        Self {
            backend,
            tasks,
            board,
            completion,
            confirmation: ConfirmationFlow::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn completion(&self) -> &CompletionSnapshot {
        &self.completion
    }

    pub fn confirmation(&self) -> &ConfirmationFlow {
        &self.confirmation
    }

    /// Route a drop through the status guard.
    ///
    /// The card only changes bucket once the store accepts the change. Storage
    /// and not-found failures are returned as errors with the board untouched.
    pub fn move_card(&mut self, event: &MoveEvent) -> Result<MoveOutcome, TaskboardError> {
        let task = self
            .tasks
            .iter()
            .find(|t| t.id == event.task_id)
            .cloned()
            .ok_or_else(|| TaskboardError::task_not_found(&event.task_id))?;

        if task.status != event.from {
            tracing::debug!(
                task_id = %task.id,
                shown = task.status.as_str(),
                reported = event.from.as_str(),
                "move event source differs from rendered bucket"
            );
        }
        if task.status == event.to {
            return Ok(MoveOutcome::NoOp);
        }

        match self.backend.update_status(&task.id, event.to, false) {
            Ok(update) => {
                self.apply(&update);
                Ok(MoveOutcome::Moved(update))
            }
            Err(e) => match e.code {
                ErrorCode::RequiresConfirmation => {
                    let pending = self.confirmation.request(&task, event.to);
                    Ok(MoveOutcome::AwaitingConfirmation(pending))
                }
                ErrorCode::StatusLocked => Ok(MoveOutcome::Rejected(e)),
                _ => Err(e),
            },
        }
    }

    /// Commit the pending move with the confirm flag. `Ok(None)` if idle.
    pub fn confirm_pending(&mut self) -> Result<Option<StatusUpdate>, TaskboardError> {
        let backend = &mut self.backend;
        let update = self
            .confirmation
            .confirm(|pending| backend.update_status(&pending.task_id, pending.requested, true))?;
        if let Some(ref update) = update {
            self.apply(update);
        }
        Ok(update)
    }

    /// Drop the pending move. No store call is made.
    pub fn cancel_pending(&mut self) -> Option<PendingTransition> {
        self.confirmation.cancel()
    }

    fn apply(&mut self, update: &StatusUpdate) {
        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == update.task.id) {
            *slot = update.task.clone();
        }
        self.board = project(&self.tasks);
        self.completion = update.completion;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connection, project_repo, task_repo};
    use crate::db::task_repo::NewTask;
    use crate::models::Priority;
    use pretty_assertions::assert_eq;
    use rusqlite::Connection;

    fn task(id: &str, status: TaskStatus, priority: Option<Priority>) -> Task {
        Task {
            id: id.into(),
            project_id: "P1".into(),
            parent_task_id: None,
            title: format!("Task {id}"),
            description: None,
            status,
            status_confirmed: status == TaskStatus::Done,
            priority,
            due_date: None,
            created_at: String::new(),
            updated_at: String::new(),
            completed_at: None,
        }
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn done_bucket_sorts_high_first() {
        let tasks = vec![
            task("1", TaskStatus::Done, Some(Priority::Low)),
            task("2", TaskStatus::Done, Some(Priority::High)),
        ];
        assert_eq!(ids(&project(&tasks).done), vec!["2", "1"]);
    }

    #[test]
    fn sort_is_stable_and_missing_priority_is_last() {
        let tasks = vec![
            task("a", TaskStatus::ToDo, None),
            task("b", TaskStatus::ToDo, Some(Priority::Medium)),
            task("c", TaskStatus::ToDo, Some(Priority::Low)),
            task("d", TaskStatus::ToDo, Some(Priority::Medium)),
            task("e", TaskStatus::InProgress, Some(Priority::High)),
        ];
        let board = project(&tasks);
        assert_eq!(ids(&board.todo), vec!["b", "d", "c", "a"]);
        assert_eq!(ids(&board.in_progress), vec!["e"]);
        assert!(board.done.is_empty());
        assert_eq!(board.bucket_of("e"), Some(TaskStatus::InProgress));
        assert_eq!(board.bucket_of("zz"), None);
    }

    #[test]
    fn projection_is_pure() {
        let tasks = vec![
            task("1", TaskStatus::ToDo, Some(Priority::Low)),
            task("2", TaskStatus::ToDo, Some(Priority::High)),
        ];
        assert_eq!(project(&tasks), project(&tasks));
        assert_eq!(ids(&tasks), vec!["1", "2"]);
    }

    fn store(tasks: &[(&str, Option<&str>)]) -> Connection {
        let conn = connection::open_in_memory().unwrap();
        project_repo::create_project(&conn, "P1", "site", "Site", None).unwrap();
        for (id, parent) in tasks {
            task_repo::create_task(
                &conn,
                &NewTask {
                    id,
                    project_id: "P1",
                    parent_task_id: *parent,
                    title: id,
                    description: None,
                    priority: Some(Priority::Medium),
                    due_date: None,
                },
            )
            .unwrap();
        }
        conn
    }

    fn session(conn: &Connection) -> BoardSession<&Connection> {
        let tasks = task_repo::list_tasks_by_project(conn, "P1").unwrap();
        BoardSession::new(conn, tasks)
    }

    fn drag(id: &str, from: TaskStatus, to: TaskStatus) -> MoveEvent {
        MoveEvent {
            task_id: id.into(),
            from,
            to,
        }
    }

    #[test]
    fn drag_to_done_waits_for_confirmation() {
        let conn = store(&[("T1", None)]);
        let mut session = session(&conn);

        let outcome = session.move_card(&drag("T1", TaskStatus::ToDo, TaskStatus::Done)).unwrap();
        assert!(matches!(outcome, MoveOutcome::AwaitingConfirmation(ref p) if p.task_id == "T1"));
        assert_eq!(ids(&session.board().todo), vec!["T1"]);
        assert!(session.board().done.is_empty());
        assert_eq!(
            task_repo::get_task_by_id(&conn, "T1").unwrap().status,
            TaskStatus::ToDo
        );

        let update = session.confirm_pending().unwrap().expect("pending move");
        assert!(update.task.status_confirmed);
        assert_eq!(ids(&session.board().done), vec!["T1"]);
        assert!(session.board().todo.is_empty());
        assert!(session.completion().is_fully_completed);
        assert!(session.confirmation().pending().is_none());
    }

    #[test]
    fn cancelled_confirmation_changes_nothing() {
        let conn = store(&[("T1", None)]);
        let mut session = session(&conn);

        session.move_card(&drag("T1", TaskStatus::ToDo, TaskStatus::Done)).unwrap();
        let cancelled = session.cancel_pending().expect("pending move");
        assert_eq!(cancelled.task_id, "T1");

        assert_eq!(ids(&session.board().todo), vec!["T1"]);
        assert!(session.confirm_pending().unwrap().is_none());
        let stored = task_repo::get_task_by_id(&conn, "T1").unwrap();
        assert_eq!(stored.status, TaskStatus::ToDo);
        assert!(!stored.status_confirmed);
    }

    #[test]
    fn drag_between_open_buckets_applies_immediately() {
        let conn = store(&[("T1", None), ("T2", None)]);
        let mut session = session(&conn);

        let outcome = session
            .move_card(&drag("T1", TaskStatus::ToDo, TaskStatus::InProgress))
            .unwrap();
        assert!(matches!(outcome, MoveOutcome::Moved(_)));
        assert_eq!(ids(&session.board().in_progress), vec!["T1"]);
        assert_eq!(ids(&session.board().todo), vec!["T2"]);
    }

    #[test]
    fn same_bucket_is_noop() {
        let conn = store(&[("T1", None)]);
        let mut session = session(&conn);
        let outcome = session.move_card(&drag("T1", TaskStatus::ToDo, TaskStatus::ToDo)).unwrap();
        assert!(matches!(outcome, MoveOutcome::NoOp));
    }

    #[test]
    fn locked_card_reverts() {
        let conn = store(&[("T1", None)]);
        crate::workflow::status::update_task_status(&conn, "T1", TaskStatus::Done, true).unwrap();
        let mut session = session(&conn);

        let outcome = session
            .move_card(&drag("T1", TaskStatus::Done, TaskStatus::InProgress))
            .unwrap();
        assert!(matches!(outcome, MoveOutcome::Rejected(ref e) if e.is_status_locked()));
        assert_eq!(ids(&session.board().done), vec!["T1"]);
        assert!(session.board().in_progress.is_empty());
    }

    #[test]
    fn stale_card_locked_elsewhere_reverts() {
        let conn = store(&[("T1", None)]);
        let mut session = session(&conn);
        crate::workflow::status::update_task_status(&conn, "T1", TaskStatus::Done, true).unwrap();

        let outcome = session
            .move_card(&drag("T1", TaskStatus::ToDo, TaskStatus::InProgress))
            .unwrap();
        assert!(matches!(outcome, MoveOutcome::Rejected(_)));
        assert_eq!(ids(&session.board().todo), vec!["T1"]);
    }

    #[test]
    fn vanished_task_propagates_not_found() {
        let conn = store(&[("T1", None)]);
        let mut session = session(&conn);
        task_repo::delete_task(&conn, "T1").unwrap();

        let err = session
            .move_card(&drag("T1", TaskStatus::ToDo, TaskStatus::InProgress))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::TaskNotFound);
        assert_eq!(ids(&session.board().todo), vec!["T1"]);
    }

    #[test]
    fn subtasks_show_on_board_but_not_in_headline() {
        let conn = store(&[("T1", None), ("S1", Some("T1"))]);
        let mut session = session(&conn);
        assert_eq!(session.board().todo.len(), 2);

        session.move_card(&drag("T1", TaskStatus::ToDo, TaskStatus::Done)).unwrap();
        session.confirm_pending().unwrap();
        assert!(session.completion().is_fully_completed);
        assert_eq!(session.completion().all_tasks_count, 2);
    }
}
