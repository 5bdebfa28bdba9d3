use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::config::Settings;
use crate::error::{ErrorCode, TaskboardError};

use super::migrations;

/// Find the .git root by walking up from current directory.
pub fn find_git_root() -> Result<PathBuf, TaskboardError> {
    let mut dir = env::current_dir().map_err(|e| TaskboardError::database(e.to_string()))?;
    loop {
        if dir.join(".git").exists() {
            return Ok(dir);
        }
        if !dir.pop() {
            return Err(TaskboardError::new(
                ErrorCode::NotInitialized,
                "Not inside a git repository. taskboard requires a git repository.",
            ));
        }
    }
}

/// Get the path to the taskboard database, honoring the `db_path` setting.
pub fn db_path(root: &Path) -> Result<PathBuf, TaskboardError> {
    let settings = Settings::load(root)?;
    Ok(settings.resolve_db_path(root))
}

/// Open the repository's database. Returns error if not initialized.
pub fn open_db() -> Result<Connection, TaskboardError> {
    let root = find_git_root()?;
    let path = db_path(&root)?;
    if !path.exists() {
        return Err(TaskboardError::not_initialized());
    }
    open_at(&path)
}

/// Open an existing database file and apply connection pragmas.
pub fn open_at(path: &Path) -> Result<Connection, TaskboardError> {
    let conn = Connection::open(path)?;
    configure_connection(&conn)?;
    tracing::debug!(path = %path.display(), "opened database");
    Ok(conn)
}

/// Initialize the database: create directories, database, and run migrations.
pub fn init_db() -> Result<PathBuf, TaskboardError> {
    let root = find_git_root()?;
    let path = db_path(&root)?;
    init_at(&path)?;
    Ok(path)
}

pub fn init_at(path: &Path) -> Result<Connection, TaskboardError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TaskboardError::database(e.to_string()))?;
    }
    let conn = open_at(path)?;
    migrations::run_migrations(&conn)?;
    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Fresh migrated in-memory database.
pub fn open_in_memory() -> Result<Connection, TaskboardError> {
    let conn = Connection::open_in_memory()?;
    configure_connection(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> Result<(), TaskboardError> {
    // journal_mode returns a row, so it cannot go through execute_batch
    let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
    conn.execute_batch(
        "PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

/// Run `f` inside a `BEGIN IMMEDIATE` transaction, rolling back on error.
pub fn with_immediate_tx<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T, TaskboardError>,
) -> Result<T, TaskboardError> {
    conn.execute_batch("BEGIN IMMEDIATE")?;
    match f(conn) {
        Ok(value) => match conn.execute_batch("COMMIT") {
            Ok(()) => Ok(value),
            Err(e) => {
                // A failed COMMIT can leave the transaction open.
                let _ = conn.execute_batch("ROLLBACK");
                Err(e.into())
            }
        },
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_commit_leaves_connection_usable() {
        let conn = open_in_memory().unwrap();

        let result = with_immediate_tx(&conn, |conn| {
            conn.execute_batch(
                "PRAGMA defer_foreign_keys = ON;
                 INSERT INTO tasks (id, project_id, title) VALUES ('T1', 'missing', 'orphan');",
            )?;
            Ok(())
        });
        assert_eq!(result.unwrap_err().code, ErrorCode::DatabaseError);
        assert!(conn.is_autocommit());

        let count = with_immediate_tx(&conn, |conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
            Ok(n)
        })
        .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn closure_error_rolls_back() {
        let conn = open_in_memory().unwrap();
        let result: Result<(), _> = with_immediate_tx(&conn, |conn| {
            conn.execute(
                "INSERT INTO projects (id, name, title) VALUES ('P1', 'site', 'Site')",
                [],
            )?;
            Err(TaskboardError::validation("abort"))
        });
        assert!(result.is_err());
        assert!(conn.is_autocommit());
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0)).unwrap();
        assert_eq!(n, 0);
    }
}
