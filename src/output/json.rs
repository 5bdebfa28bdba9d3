use serde_json::{json, Value};

use crate::error::TaskboardError;
use crate::models::{CompletionSnapshot, Project, StoredEvent, Task};
use crate::workflow::board::Board;
use crate::workflow::status::StatusUpdate;

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

pub fn error(err: &TaskboardError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": err.code.as_str(),
            "message": err.message
        }
    })
}

pub fn render(value: &Value) -> String {
    format!("{value:#}")
}

/// Same shape as the snapshot inside event payloads. Unrounded; only the text
/// output rounds.
pub fn completion_json(c: &CompletionSnapshot) -> Value {
    serde_json::to_value(c).unwrap_or(Value::Null)
}

pub fn task_summary(t: &Task) -> Value {
    let mut v = json!({
        "id": t.id,
        "title": t.title,
        "status": t.status.as_str(),
        "statusConfirmed": t.status_confirmed,
        "priority": t.priority.map(|p| p.as_str())
    });
    if let Some(ref parent) = t.parent_task_id {
        v["parentTaskId"] = json!(parent);
    }
    if let Some(ref due) = t.due_date {
        v["dueDate"] = json!(due);
    }
    v
}

pub fn task_detail(t: &Task) -> Value {
    json!({
        "id": t.id,
        "projectId": t.project_id,
        "parentTaskId": t.parent_task_id,
        "title": t.title,
        "description": t.description,
        "status": t.status.as_str(),
        "statusConfirmed": t.status_confirmed,
        "priority": t.priority.map(|p| p.as_str()),
        "dueDate": t.due_date,
        "createdAt": t.created_at,
        "updatedAt": t.updated_at,
        "completedAt": t.completed_at
    })
}

pub fn project_json(p: &Project) -> Value {
    json!({
        "id": p.id,
        "name": p.name,
        "title": p.title,
        "description": p.description,
        "createdAt": p.created_at,
        "updatedAt": p.updated_at
    })
}

pub fn event_json(e: &StoredEvent) -> Value {
    let mut v = serde_json::to_value(&e.event).unwrap_or(Value::Null);
    v["seq"] = json!(e.seq);
    v["createdAt"] = json!(e.created_at);
    v
}

pub fn board_json(board: &Board) -> Value {
    let columns: Vec<Value> = board
        .columns()
        .iter()
        .map(|(status, tasks)| {
            json!({
                "status": status.as_str(),
                "tasks": tasks.iter().map(task_summary).collect::<Vec<_>>()
            })
        })
        .collect();
    json!(columns)
}

pub fn status_update_json(u: &StatusUpdate) -> Value {
    json!({
        "task": task_summary(&u.task),
        "previousStatus": u.previous_status.as_str(),
        "changed": u.changed,
        "completion": completion_json(&u.completion),
        "events": u.events.iter().map(event_json).collect::<Vec<_>>()
    })
}
