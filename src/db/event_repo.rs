use rusqlite::{params, Connection};

use crate::error::TaskboardError;
use crate::models::{ProjectEvent, StoredEvent};

/// Append an event to the project outbox.
pub fn append_event(conn: &Connection, event: &ProjectEvent) -> Result<StoredEvent, TaskboardError> {
    let payload = serde_json::to_string(event).map_err(|e| TaskboardError::database(e.to_string()))?;
    conn.execute(
        "INSERT INTO project_events (project_id, kind, payload) VALUES (?1, ?2, ?3)",
        params![event.project_id(), event.kind(), payload],
    )?;
    let seq = conn.last_insert_rowid();
    let created_at: String = conn.query_row(
        "SELECT created_at FROM project_events WHERE seq = ?1",
        params![seq],
        |row| row.get(0),
    )?;
    Ok(StoredEvent {
        seq,
        created_at,
        event: event.clone(),
    })
}

/// Events for a project with `seq > since`, oldest first.
pub fn list_events(conn: &Connection, project_id: &str, since: i64) -> Result<Vec<StoredEvent>, TaskboardError> {
    let mut stmt = conn.prepare(
        "SELECT seq, payload, created_at FROM project_events
         WHERE project_id = ?1 AND seq > ?2
         ORDER BY seq ASC",
    )?;
    let rows = stmt
        .query_map(params![project_id, since], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(seq, payload, created_at)| {
            let event = serde_json::from_str(&payload).map_err(|e| {
                TaskboardError::database(format!("Corrupt event payload at seq {seq}: {e}"))
            })?;
            Ok(StoredEvent {
                seq,
                created_at,
                event,
            })
        })
        .collect()
}
