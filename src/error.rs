use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotInitialized,
    NoActiveProject,
    ProjectNotFound,
    ProjectNameConflict,
    TaskNotFound,
    AmbiguousRef,
    RequiresConfirmation,
    StatusLocked,
    ValidationError,
    ConfigError,
    DatabaseError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::NoActiveProject => "NO_ACTIVE_PROJECT",
            Self::ProjectNotFound => "PROJECT_NOT_FOUND",
            Self::ProjectNameConflict => "PROJECT_NAME_CONFLICT",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::AmbiguousRef => "AMBIGUOUS_REF",
            Self::RequiresConfirmation => "REQUIRES_CONFIRMATION",
            Self::StatusLocked => "STATUS_LOCKED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
        }
    }

    /// Process exit code for a failed command.
    /// A pending confirmation is an expected outcome, not a failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RequiresConfirmation => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct TaskboardError {
    pub code: ErrorCode,
    pub message: String,
}

impl TaskboardError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_initialized() -> Self {
        Self::new(
            ErrorCode::NotInitialized,
            "taskboard is not initialized. Run `taskboard init` first.",
        )
    }

    pub fn no_active_project() -> Self {
        Self::new(
            ErrorCode::NoActiveProject,
            "No active project. Use `taskboard project activate <name>` or `--project <name>`.",
        )
    }

    pub fn project_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::ProjectNotFound,
            format!("Project not found: {reference}"),
        )
    }

    pub fn project_name_conflict(name: &str) -> Self {
        Self::new(
            ErrorCode::ProjectNameConflict,
            format!("Project with name '{name}' already exists"),
        )
    }

    pub fn task_not_found(reference: &str) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {reference}"),
        )
    }

    pub fn ambiguous_ref(reference: &str, candidates: &[String]) -> Self {
        Self::new(
            ErrorCode::AmbiguousRef,
            format!(
                "Ambiguous reference '{}'. Candidates: {}",
                reference,
                candidates.join(", ")
            ),
        )
    }

    pub fn requires_confirmation(task_id: &str, title: &str) -> Self {
        Self::new(
            ErrorCode::RequiresConfirmation,
            format!(
                "Moving '{title}' ({task_id}) to Done locks its status permanently. Re-run with --confirm to proceed."
            ),
        )
    }

    pub fn status_locked(task_id: &str, title: &str) -> Self {
        Self::new(
            ErrorCode::StatusLocked,
            format!("Task '{title}' ({task_id}) is confirmed Done and its status can no longer change"),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn is_requires_confirmation(&self) -> bool {
        self.code == ErrorCode::RequiresConfirmation
    }

    pub fn is_status_locked(&self) -> bool {
        self.code == ErrorCode::StatusLocked
    }
}

impl From<rusqlite::Error> for TaskboardError {
    fn from(e: rusqlite::Error) -> Self {
        Self::database(e.to_string())
    }
}

impl From<ConfigError> for TaskboardError {
    fn from(e: ConfigError) -> Self {
        Self::new(ErrorCode::ConfigError, e.to_string())
    }
}
