pub mod commands;
pub mod init;
pub mod project;
pub mod task;
pub mod board;
pub mod completion;
pub mod events;

pub use commands::*;

use rusqlite::Connection;

use crate::config;
use crate::db::{connection, project_repo};
use crate::error::TaskboardError;
use crate::output;

/// Print an error in the requested format and return the process exit code.
pub fn report_error(e: &TaskboardError, json_output: bool) -> i32 {
    if json_output {
        println!("{}", output::json::render(&output::json::error(e)));
    } else {
        eprintln!("Error: {}", e.message);
    }
    e.code.exit_code()
}

/// Turn a command result into an exit code.
pub fn finish(result: Result<i32, TaskboardError>, json_output: bool) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => report_error(&e, json_output),
    }
}

/// `--project` if given, otherwise the active project.
pub fn resolve_project_id(conn: &Connection, project_flag: Option<&str>) -> Result<String, TaskboardError> {
    if let Some(reference) = project_flag {
        let project = project_repo::resolve_project(conn, reference)?;
        return Ok(project.id);
    }
    let root = connection::find_git_root()?;
    let id = config::active_project_id(&root).ok_or_else(TaskboardError::no_active_project)?;
    // The active project may have been deleted by another process.
    project_repo::get_project_by_id(conn, &id)?;
    Ok(id)
}
