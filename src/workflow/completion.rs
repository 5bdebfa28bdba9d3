use crate::models::{CompletionSnapshot, Task, TaskStatus};

/// Roll up a project's completion from its full task set, subtasks included.
///
/// Only top-level tasks count toward the headline figures; subtasks only show
/// up in `all_tasks_count`.
pub fn aggregate(tasks: &[Task]) -> CompletionSnapshot {
    let all_tasks_count = tasks.len() as u64;
    let (parents, completed) = tasks
        .iter()
        .filter(|t| t.is_top_level())
        .fold((0u64, 0u64), |(parents, completed), t| {
            let done = t.status == TaskStatus::Done && t.status_confirmed;
            (parents + 1, completed + u64::from(done))
        });

    let completion_percentage = if parents == 0 {
        0.0
    } else {
        completed as f64 / parents as f64 * 100.0
    };

    CompletionSnapshot {
        total_tasks: parents,
        completed_tasks: completed,
        completion_percentage,
        is_fully_completed: parents > 0 && completed == parents,
        parent_tasks_count: parents,
        all_tasks_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;

    fn task(id: &str, parent: Option<&str>, status: TaskStatus, confirmed: bool) -> Task {
        Task {
            id: id.into(),
            project_id: "P1".into(),
            parent_task_id: parent.map(Into::into),
            title: id.into(),
            description: None,
            status,
            status_confirmed: confirmed,
            priority: Some(Priority::Medium),
            due_date: None,
            created_at: String::new(),
            updated_at: String::new(),
            completed_at: None,
        }
    }

    #[test]
    fn empty_project_is_zero_percent() {
        let snapshot = aggregate(&[]);
        assert_eq!(snapshot.total_tasks, 0);
        assert_eq!(snapshot.completion_percentage, 0.0);
        assert!(!snapshot.completion_percentage.is_nan());
        assert!(!snapshot.is_fully_completed);
    }

    #[test]
    fn only_subtasks_is_zero_percent() {
        let tasks = vec![task("s1", Some("gone"), TaskStatus::Done, true)];
        let snapshot = aggregate(&tasks);
        assert_eq!(snapshot.total_tasks, 0);
        assert_eq!(snapshot.completion_percentage, 0.0);
        assert_eq!(snapshot.all_tasks_count, 1);
    }

    #[test]
    fn three_of_four_is_seventy_five() {
        let tasks = vec![
            task("1", None, TaskStatus::Done, true),
            task("2", None, TaskStatus::Done, true),
            task("3", None, TaskStatus::Done, true),
            task("4", None, TaskStatus::InProgress, false),
        ];
        let snapshot = aggregate(&tasks);
        assert_eq!(snapshot.completed_tasks, 3);
        assert_eq!(snapshot.total_tasks, 4);
        assert!((snapshot.completion_percentage - 75.0).abs() < 1e-9);
        assert!(!snapshot.is_fully_completed);
    }

    #[test]
    fn subtasks_do_not_count_toward_headline() {
        let tasks = vec![
            task("1", None, TaskStatus::Done, true),
            task("1a", Some("1"), TaskStatus::ToDo, false),
            task("1b", Some("1"), TaskStatus::InProgress, false),
        ];
        let snapshot = aggregate(&tasks);
        assert_eq!(snapshot.total_tasks, 1);
        assert_eq!(snapshot.parent_tasks_count, 1);
        assert_eq!(snapshot.all_tasks_count, 3);
        assert!(snapshot.is_fully_completed);
        assert_eq!(snapshot.completion_percentage, 100.0);
    }

    #[test]
    fn unconfirmed_done_is_not_completed() {
        let tasks = vec![task("1", None, TaskStatus::Done, false)];
        let snapshot = aggregate(&tasks);
        assert_eq!(snapshot.completed_tasks, 0);
        assert!(!snapshot.is_fully_completed);
    }

    #[test]
    fn recomputation_is_idempotent() {
        let tasks = vec![
            task("1", None, TaskStatus::Done, true),
            task("2", None, TaskStatus::ToDo, false),
        ];
        assert_eq!(aggregate(&tasks), aggregate(&tasks));
    }
}
