use std::io::{self, BufRead, Write};

use serde_json::json;

use crate::cli::commands::BoardCommands;
use crate::cli::resolve_project_id;
use crate::db::{connection, task_repo};
use crate::error::TaskboardError;
use crate::models::TaskStatus;
use crate::output;
use crate::workflow::board::{self, BoardSession, MoveEvent, MoveOutcome};
use crate::workflow::confirmation::PendingTransition;
use crate::workflow::status::StatusUpdate;

pub fn run(cmd: Option<BoardCommands>, json_output: bool, project_flag: Option<&str>) -> i32 {
    let result = match cmd {
        None => run_show(json_output, project_flag),
        Some(BoardCommands::Move { id, to, yes }) => run_move(&id, to, yes, json_output, project_flag),
    };
    super::finish(result, json_output)
}

fn run_show(json_output: bool, project_flag: Option<&str>) -> Result<i32, TaskboardError> {
    let conn = connection::open_db()?;
    let project_id = resolve_project_id(&conn, project_flag)?;
    let tasks = task_repo::list_tasks_by_project(&conn, &project_id)?;
    let board = board::project(&tasks);

    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "columns": output::json::board_json(&board)
            })))
        );
    } else {
        output::text::print_board(&board);
    }
    Ok(0)
}

fn run_move(
    id: &str,
    to: TaskStatus,
    yes: bool,
    json_output: bool,
    project_flag: Option<&str>,
) -> Result<i32, TaskboardError> {
    let conn = connection::open_db()?;
    let project_id = resolve_project_id(&conn, project_flag)?;
    let task = task_repo::resolve_task(&conn, &project_id, id)?;
    let tasks = task_repo::list_tasks_by_project(&conn, &project_id)?;

    let mut session = BoardSession::new(&conn, tasks);
    let event = MoveEvent {
        task_id: task.id.clone(),
        from: task.status,
        to,
    };

    let (outcome, update) = match session.move_card(&event)? {
        MoveOutcome::NoOp => ("noop", None),
        MoveOutcome::Moved(update) => ("moved", Some(update)),
        MoveOutcome::Rejected(e) => return Err(e),
        MoveOutcome::AwaitingConfirmation(pending) => {
            let accepted = if yes {
                true
            } else if json_output {
                // No interactive prompt in machine mode.
                session.cancel_pending();
                return Err(TaskboardError::requires_confirmation(&pending.task_id, &pending.title));
            } else {
                prompt_confirm(&pending)?
            };
            if accepted {
                ("moved", session.confirm_pending()?)
            } else {
                session.cancel_pending();
                ("cancelled", None)
            }
        }
    };

    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "outcome": outcome,
                "update": update.as_ref().map(output::json::status_update_json),
                "completion": output::json::completion_json(session.completion()),
                "columns": output::json::board_json(session.board())
            })))
        );
    } else {
        print_outcome(outcome, &task.title, to, update.as_ref());
        println!();
        output::text::print_board(session.board());
        println!();
        output::text::print_completion(session.completion());
    }
    Ok(0)
}

fn print_outcome(outcome: &str, title: &str, to: TaskStatus, update: Option<&StatusUpdate>) {
    match (outcome, update) {
        ("moved", Some(u)) => {
            let lock = if u.task.is_locked() { " [locked]" } else { "" };
            println!(
                "Moved '{}': {} → {}{lock}",
                title,
                u.previous_status.as_str(),
                u.task.status.as_str()
            );
        }
        ("cancelled", _) => println!("Cancelled. '{title}' stays where it was."),
        _ => println!("'{title}' is already in {}.", to.as_str()),
    }
}

/// Ask on stderr, read the answer from stdin. Anything but yes declines.
fn prompt_confirm(pending: &PendingTransition) -> Result<bool, TaskboardError> {
    let mut stderr = io::stderr();
    write!(stderr, "{} [y/N] ", pending.prompt())
        .and_then(|_| stderr.flush())
        .map_err(|e| TaskboardError::validation(e.to_string()))?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| TaskboardError::validation(e.to_string()))?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
