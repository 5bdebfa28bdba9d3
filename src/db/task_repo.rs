use rusqlite::{params, Connection, OptionalExtension};

use crate::error::TaskboardError;
use crate::models::{Priority, Task, TaskStatus};

const TASK_COLUMNS: &str = "id, project_id, parent_task_id, title, description, status,
                status_confirmed, priority, due_date, created_at, updated_at, completed_at";

pub struct NewTask<'a> {
    pub id: &'a str,
    pub project_id: &'a str,
    pub parent_task_id: Option<&'a str>,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub priority: Option<Priority>,
    pub due_date: Option<&'a str>,
}

/// Field edits. `None` leaves a field unchanged; status is deliberately absent.
#[derive(Debug, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<String>>,
}

impl TaskEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }
}

pub fn create_task(conn: &Connection, new: &NewTask) -> Result<Task, TaskboardError> {
    let sort_order: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM tasks WHERE project_id = ?1",
        params![new.project_id],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT INTO tasks (id, project_id, parent_task_id, title, description, priority, due_date, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            new.id,
            new.project_id,
            new.parent_task_id,
            new.title,
            new.description,
            new.priority.map(|p| p.as_str()),
            new.due_date,
            sort_order
        ],
    )?;
    get_task_by_id(conn, new.id)
}

pub fn get_task_by_id(conn: &Connection, id: &str) -> Result<Task, TaskboardError> {
    find_task_by_id(conn, id)?.ok_or_else(|| TaskboardError::task_not_found(id))
}

pub fn find_task_by_id(conn: &Connection, id: &str) -> Result<Option<Task>, TaskboardError> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            params![id],
            row_to_task,
        )
        .optional()?;
    Ok(task)
}

/// Resolve task by ID prefix within a project.
pub fn resolve_task(conn: &Connection, project_id: &str, reference: &str) -> Result<Task, TaskboardError> {
    if let Some(task) = find_task_by_id(conn, reference)? {
        if task.project_id == project_id {
            return Ok(task);
        }
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = ?1 AND id LIKE ?2 ESCAPE '\\'"
    ))?;
    let prefix = format!("{}%", super::escape_like(reference));
    let mut tasks: Vec<Task> = stmt
        .query_map(params![project_id, prefix], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;

    match tasks.len() {
        0 => Err(TaskboardError::task_not_found(reference)),
        1 => Ok(tasks.remove(0)),
        _ => {
            let candidates: Vec<String> = tasks.iter().map(|t| format!("{} ({})", t.title, t.id)).collect();
            Err(TaskboardError::ambiguous_ref(reference, &candidates))
        }
    }
}

/// All tasks of a project, subtasks included, in creation order.
pub fn list_tasks_by_project(conn: &Connection, project_id: &str) -> Result<Vec<Task>, TaskboardError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = ?1 ORDER BY sort_order ASC"
    ))?;
    let tasks = stmt
        .query_map(params![project_id], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

pub fn list_subtasks(conn: &Connection, parent_task_id: &str) -> Result<Vec<Task>, TaskboardError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE parent_task_id = ?1 ORDER BY sort_order ASC"
    ))?;
    let tasks = stmt
        .query_map(params![parent_task_id], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

pub fn update_task_details(conn: &Connection, id: &str, edit: &TaskEdit) -> Result<Task, TaskboardError> {
    let (desc_set, desc_value) = match edit.description {
        Some(ref desc) => (true, desc.clone()),
        None => (false, None),
    };
    let (due_set, due_value) = match edit.due_date {
        Some(ref due) => (true, due.clone()),
        None => (false, None),
    };
    let changed = conn.execute(
        "UPDATE tasks SET
             title = COALESCE(?1, title),
             description = CASE WHEN ?2 THEN ?3 ELSE description END,
             priority = COALESCE(?4, priority),
             due_date = CASE WHEN ?5 THEN ?6 ELSE due_date END,
             updated_at = datetime('now')
         WHERE id = ?7",
        params![
            edit.title,
            desc_set,
            desc_value,
            edit.priority.map(|p| p.as_str()),
            due_set,
            due_value,
            id
        ],
    )?;
    if changed == 0 {
        return Err(TaskboardError::task_not_found(id));
    }
    get_task_by_id(conn, id)
}

/// Write a new status unless the row is already locked in `Done`.
///
/// Returns `false` when no row was changed: the task is gone or locked.
pub fn set_status(
    conn: &Connection,
    id: &str,
    status: TaskStatus,
    confirmed: bool,
) -> Result<bool, TaskboardError> {
    let completed_clause = if status == TaskStatus::Done && confirmed {
        "completed_at = datetime('now'),"
    } else {
        ""
    };
    let sql = format!(
        "UPDATE tasks SET status = ?1, status_confirmed = ?2, {completed_clause}
         updated_at = datetime('now')
         WHERE id = ?3 AND status != 'Done'"
    );
    let changed = conn.execute(&sql, params![status.as_str(), confirmed, id])?;
    Ok(changed > 0)
}

pub fn delete_task(conn: &Connection, id: &str) -> Result<(), TaskboardError> {
    let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(TaskboardError::task_not_found(id));
    }
    Ok(())
}

fn parse_status_column(raw: String) -> rusqlite::Result<TaskStatus> {
    TaskStatus::from_str(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unknown task status '{raw}'").into(),
        )
    })
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        parent_task_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        status: parse_status_column(row.get(5)?)?,
        status_confirmed: row.get(6)?,
        priority: row
            .get::<_, Option<String>>(7)?
            .as_deref()
            .and_then(Priority::from_str),
        due_date: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        completed_at: row.get(11)?,
    })
}
