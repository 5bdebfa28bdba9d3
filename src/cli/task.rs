use chrono::NaiveDate;
use serde_json::json;

use crate::cli::commands::TaskCommands;
use crate::cli::resolve_project_id;
use crate::config::Settings;
use crate::db::task_repo::{NewTask, TaskEdit};
use crate::db::{connection, task_repo};
use crate::error::TaskboardError;
use crate::models::{Priority, TaskStatus};
use crate::output;
use crate::workflow::status;

pub fn run(cmd: TaskCommands, json_output: bool, project_flag: Option<&str>) -> i32 {
    let result = match cmd {
        TaskCommands::Add { title, description, priority, due, parent } => run_add(
            &title,
            description.as_deref(),
            priority,
            due.as_deref(),
            parent.as_deref(),
            json_output,
            project_flag,
        ),
        TaskCommands::List { status, priority } => run_list(status, priority, json_output, project_flag),
        TaskCommands::Show { id } => run_show(&id, json_output, project_flag),
        TaskCommands::Edit {
            id,
            title,
            description,
            clear_description,
            priority,
            due,
            clear_due,
        } => {
            let description = match (description, clear_description) {
                (_, true) => Some(None),
                (Some(d), false) => Some(Some(d)),
                (None, false) => None,
            };
            let due_date = match (due, clear_due) {
                (_, true) => Some(None),
                (Some(d), false) => Some(Some(d)),
                (None, false) => None,
            };
            let edit = TaskEdit {
                title,
                description,
                priority,
                due_date,
            };
            run_edit(&id, edit, json_output, project_flag)
        }
        TaskCommands::Status { id, status, confirm } => {
            run_status(&id, status, confirm, json_output, project_flag)
        }
        TaskCommands::Delete { id } => run_delete(&id, json_output, project_flag),
    };
    super::finish(result, json_output)
}

fn validate_title(title: &str) -> Result<(), TaskboardError> {
    if title.trim().is_empty() {
        return Err(TaskboardError::validation("Task title is required"));
    }
    Ok(())
}

/// Due dates are calendar dates in `YYYY-MM-DD` form.
pub fn validate_due_date(due: &str) -> Result<(), TaskboardError> {
    NaiveDate::parse_from_str(due, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| TaskboardError::validation(format!("Invalid due date '{due}' (expected YYYY-MM-DD)")))
}

fn run_add(
    title: &str,
    description: Option<&str>,
    priority: Option<Priority>,
    due: Option<&str>,
    parent: Option<&str>,
    json_output: bool,
    project_flag: Option<&str>,
) -> Result<i32, TaskboardError> {
    validate_title(title)?;
    if let Some(due) = due {
        validate_due_date(due)?;
    }

    let conn = connection::open_db()?;
    let project_id = resolve_project_id(&conn, project_flag)?;

    // Subtasks nest one level deep, within the same project.
    let parent_id = match parent {
        Some(reference) => {
            let parent_task = task_repo::resolve_task(&conn, &project_id, reference)?;
            if !parent_task.is_top_level() {
                return Err(TaskboardError::validation(format!(
                    "Task {} is itself a subtask and cannot have subtasks",
                    parent_task.id
                )));
            }
            Some(parent_task.id)
        }
        None => None,
    };

    let priority = match priority {
        Some(p) => p,
        None => Settings::load(&connection::find_git_root()?)?.default_priority,
    };

    let task_id = ulid::Ulid::new().to_string();
    let task = connection::with_immediate_tx(&conn, |conn| {
        task_repo::create_task(
            conn,
            &NewTask {
                id: &task_id,
                project_id: &project_id,
                parent_task_id: parent_id.as_deref(),
                title,
                description,
                priority: Some(priority),
                due_date: due,
            },
        )
    })?;
    tracing::info!(task_id = %task.id, project_id = %project_id, "task created");

    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "task": output::json::task_detail(&task)
            })))
        );
    } else {
        println!("Added task: {} ({})", task.title, task.id);
    }
    Ok(0)
}

fn run_list(
    status: Option<TaskStatus>,
    priority: Option<Priority>,
    json_output: bool,
    project_flag: Option<&str>,
) -> Result<i32, TaskboardError> {
    let conn = connection::open_db()?;
    let project_id = resolve_project_id(&conn, project_flag)?;
    let tasks: Vec<_> = task_repo::list_tasks_by_project(&conn, &project_id)?
        .into_iter()
        .filter(|t| status.map_or(true, |s| t.status == s))
        .filter(|t| priority.map_or(true, |p| t.priority == Some(p)))
        .collect();

    if json_output {
        let tasks_json: Vec<_> = tasks.iter().map(output::json::task_summary).collect();
        println!(
            "{}",
            output::json::render(&output::json::success(json!({ "tasks": tasks_json })))
        );
    } else {
        output::text::print_task_list(&tasks);
    }
    Ok(0)
}

fn run_show(id: &str, json_output: bool, project_flag: Option<&str>) -> Result<i32, TaskboardError> {
    let conn = connection::open_db()?;
    let project_id = resolve_project_id(&conn, project_flag)?;
    let task = task_repo::resolve_task(&conn, &project_id, id)?;
    let subtasks = task_repo::list_subtasks(&conn, &task.id)?;

    if json_output {
        let subtasks_json: Vec<_> = subtasks.iter().map(output::json::task_summary).collect();
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "task": output::json::task_detail(&task),
                "subtasks": subtasks_json
            })))
        );
    } else {
        output::text::print_task(&task);
        if !subtasks.is_empty() {
            println!("\nSubtasks:");
            output::text::print_task_list(&subtasks);
        }
    }
    Ok(0)
}

fn run_edit(id: &str, edit: TaskEdit, json_output: bool, project_flag: Option<&str>) -> Result<i32, TaskboardError> {
    if edit.is_empty() {
        return Err(TaskboardError::validation(
            "Nothing to edit. Use --title, --description, --clear-description, --priority, --due or --clear-due.",
        ));
    }
    if let Some(ref title) = edit.title {
        validate_title(title)?;
    }
    if let Some(Some(ref due)) = edit.due_date {
        validate_due_date(due)?;
    }

    let conn = connection::open_db()?;
    let project_id = resolve_project_id(&conn, project_flag)?;
    let task = task_repo::resolve_task(&conn, &project_id, id)?;
    let updated = task_repo::update_task_details(&conn, &task.id, &edit)?;

    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "task": output::json::task_detail(&updated)
            })))
        );
    } else {
        println!("Updated task: {} ({})", updated.title, updated.id);
    }
    Ok(0)
}

fn run_status(
    id: &str,
    requested: TaskStatus,
    confirm: bool,
    json_output: bool,
    project_flag: Option<&str>,
) -> Result<i32, TaskboardError> {
    let conn = connection::open_db()?;
    let project_id = resolve_project_id(&conn, project_flag)?;
    let task = task_repo::resolve_task(&conn, &project_id, id)?;
    let update = status::update_task_status(&conn, &task.id, requested, confirm)?;

    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(output::json::status_update_json(&update)))
        );
    } else {
        if update.changed {
            let lock = if update.task.is_locked() { " [locked]" } else { "" };
            println!(
                "Task {}: {} → {}{lock}",
                update.task.id,
                update.previous_status.as_str(),
                update.task.status.as_str()
            );
        } else {
            println!("Task {} already {}", update.task.id, update.task.status.as_str());
        }
        output::text::print_completion(&update.completion);
    }
    Ok(0)
}

fn run_delete(id: &str, json_output: bool, project_flag: Option<&str>) -> Result<i32, TaskboardError> {
    let conn = connection::open_db()?;
    let project_id = resolve_project_id(&conn, project_flag)?;
    let task = task_repo::resolve_task(&conn, &project_id, id)?;
    task_repo::delete_task(&conn, &task.id)?;
    tracing::info!(task_id = %task.id, "task deleted");

    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "deleted": { "id": task.id, "title": task.title }
            })))
        );
    } else {
        println!("Deleted task: {} ({})", task.title, task.id);
    }
    Ok(0)
}
