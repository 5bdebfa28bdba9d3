use clap::{Parser, Subcommand};

use crate::models::{Priority, TaskStatus};

const VERSION: &str = env!("TASKBOARD_VERSION");

fn parse_status(s: &str) -> Result<TaskStatus, String> {
    TaskStatus::parse_arg(s)
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::parse_arg(s)
}

#[derive(Parser)]
#[command(
    name = "taskboard",
    version = VERSION,
    about = "Project task board with a one-way Done lock",
    after_help = "\
NOTE:
  Requires a git repository. DB is stored at <git-root>/.taskboard/taskboard.db
  Run `taskboard init` before any other command.

EXIT CODES:
  0  Success
  1  Error (DB, validation, locked status, etc.)
  2  Confirmation required (re-run with --confirm / --yes)

STATUS LOCK:
  Statuses are `To-Do`, `In Progress` and `Done`.
  Moving a task to `Done` requires confirmation and locks its status for good.
  A locked task can still be edited (title, description, priority, due date).

CONFIG:
  <git-root>/.taskboard/config.toml and TASKBOARD_* env vars
  (db_path, default_priority, log_level). TASKBOARD_LOG sets the log filter."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Specify project by name or ID
    #[arg(long, global = true)]
    pub project: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize taskboard in this repository
    Init,

    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Show the board, or move a card between columns
    Board {
        #[command(subcommand)]
        command: Option<BoardCommands>,
    },

    /// Show project completion
    Completion,

    /// List project events (completion updates)
    #[command(after_help = "\
NOTE:
  Events are delivered at-least-once. Use `seq` to de-duplicate and
  `--since <seq>` to resume after the last event you processed.")]
    Events {
        /// Only events with a sequence number greater than this
        #[arg(long, default_value = "0")]
        since: i64,
    },
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Create a new project
    Create {
        /// Project name (slug: lowercase alphanumeric with hyphens)
        name: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List all projects
    List,
    /// Show project details
    Show {
        /// Project name or ID
        reference: String,
    },
    /// Set active project
    Activate {
        /// Project name or ID
        reference: String,
    },
    /// Delete a project and all its tasks
    Delete {
        /// Project name or ID
        reference: String,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task to the active project
    Add {
        /// Task title
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Low, Medium or High (default from config)
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Parent task ID (creates a subtask)
        #[arg(long)]
        parent: Option<String>,
    },
    /// List tasks in the active project
    List {
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
    },
    /// Show task details
    Show {
        /// Task ID or prefix
        id: String,
    },
    /// Edit task fields (status is changed with `task status`)
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        /// Remove the description
        #[arg(long)]
        clear_description: bool,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },
    /// Change task status (To-Do, In Progress, Done)
    #[command(after_help = "\
NOTE:
  Moving to Done without --confirm fails with REQUIRES_CONFIRMATION (exit 2)
  and changes nothing. With --confirm the task is locked in Done.")]
    Status {
        id: String,
        #[arg(value_parser = parse_status)]
        status: TaskStatus,
        /// Confirm a transition into Done
        #[arg(long)]
        confirm: bool,
    },
    /// Delete a task (and its subtasks)
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum BoardCommands {
    /// Move a card to another column
    #[command(after_help = "\
NOTE:
  Moving to Done asks for confirmation on stdin (y/N) unless --yes is given.
  Answering no leaves the card where it was.")]
    Move {
        id: String,
        #[arg(value_parser = parse_status)]
        to: TaskStatus,
        /// Confirm a move into Done without prompting
        #[arg(long)]
        yes: bool,
    },
}
