use rusqlite::{params, Connection};

use crate::error::TaskboardError;
use crate::models::Project;

const PROJECT_COLUMNS: &str = "id, name, title, description, created_at, updated_at";

pub fn create_project(
    conn: &Connection,
    id: &str,
    name: &str,
    title: &str,
    description: Option<&str>,
) -> Result<Project, TaskboardError> {
    if find_project_by_name(conn, name)?.is_some() {
        return Err(TaskboardError::project_name_conflict(name));
    }

    conn.execute(
        "INSERT INTO projects (id, name, title, description) VALUES (?1, ?2, ?3, ?4)",
        params![id, name, title, description],
    )?;

    get_project_by_id(conn, id)
}

pub fn get_project_by_id(conn: &Connection, id: &str) -> Result<Project, TaskboardError> {
    conn.query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
        params![id],
        row_to_project,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => TaskboardError::project_not_found(id),
        _ => TaskboardError::from(e),
    })
}

pub fn find_project_by_name(conn: &Connection, name: &str) -> Result<Option<Project>, TaskboardError> {
    let mut stmt = conn.prepare(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE name = ?1"))?;
    let mut rows = stmt.query(params![name])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_project(row)?)),
        None => Ok(None),
    }
}

/// Resolve a project reference: exact name → ULID prefix → name partial match.
pub fn resolve_project(conn: &Connection, reference: &str) -> Result<Project, TaskboardError> {
    if let Some(project) = find_project_by_name(conn, reference)? {
        return Ok(project);
    }

    let by_id = query_projects(
        conn,
        &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id LIKE ?1 ESCAPE '\\'"),
        &format!("{}%", super::escape_like(reference)),
    )?;
    if by_id.len() > 1 {
        return Err(ambiguous(reference, &by_id));
    }
    if let Some(project) = by_id.into_iter().next() {
        return Ok(project);
    }

    let mut by_name = query_projects(
        conn,
        &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE name LIKE ?1 ESCAPE '\\'"),
        &format!("%{}%", super::escape_like(reference)),
    )?;
    match by_name.len() {
        0 => Err(TaskboardError::project_not_found(reference)),
        1 => Ok(by_name.remove(0)),
        _ => Err(ambiguous(reference, &by_name)),
    }
}

pub fn list_projects(conn: &Connection) -> Result<Vec<Project>, TaskboardError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at DESC, id DESC"
    ))?;
    let projects = stmt
        .query_map([], row_to_project)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(projects)
}

/// Delete a project. Tasks and events cascade.
pub fn delete_project(conn: &Connection, id: &str) -> Result<(), TaskboardError> {
    let changed = conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(TaskboardError::project_not_found(id));
    }
    Ok(())
}

fn query_projects(conn: &Connection, sql: &str, pattern: &str) -> Result<Vec<Project>, TaskboardError> {
    let mut stmt = conn.prepare(sql)?;
    let projects = stmt
        .query_map(params![pattern], row_to_project)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(projects)
}

fn ambiguous(reference: &str, projects: &[Project]) -> TaskboardError {
    let candidates: Vec<String> = projects.iter().map(|p| format!("{} ({})", p.name, p.id)).collect();
    TaskboardError::ambiguous_ref(reference, &candidates)
}

fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
