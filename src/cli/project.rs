use serde_json::json;

use crate::cli::commands::ProjectCommands;
use crate::config;
use crate::db::{connection, project_repo, task_repo};
use crate::error::TaskboardError;
use crate::output;
use crate::workflow::completion;

pub fn run(cmd: ProjectCommands, json_output: bool) -> i32 {
    let result = match cmd {
        ProjectCommands::Create { name, title, description } => {
            run_create(&name, title.as_deref(), description.as_deref(), json_output)
        }
        ProjectCommands::List => run_list(json_output),
        ProjectCommands::Show { reference } => run_show(&reference, json_output),
        ProjectCommands::Activate { reference } => run_activate(&reference, json_output),
        ProjectCommands::Delete { reference } => run_delete(&reference, json_output),
    };
    super::finish(result, json_output)
}

/// `^[a-z0-9][a-z0-9-]*[a-z0-9]$`, or a single `[a-z0-9]`.
pub fn validate_project_name(name: &str) -> Result<(), TaskboardError> {
    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let valid = match (name.chars().next(), name.chars().last()) {
        (Some(first), Some(last)) => {
            allowed(first) && allowed(last) && name.chars().all(|c| allowed(c) || c == '-')
        }
        _ => false,
    };
    if !valid {
        return Err(TaskboardError::validation(
            "Project name must match ^[a-z0-9][a-z0-9-]*[a-z0-9]$ (or single char [a-z0-9])",
        ));
    }
    Ok(())
}

fn run_create(
    name: &str,
    title: Option<&str>,
    description: Option<&str>,
    json_output: bool,
) -> Result<i32, TaskboardError> {
    validate_project_name(name)?;
    let conn = connection::open_db()?;
    let id = ulid::Ulid::new().to_string();
    let title = title.unwrap_or(name);
    let project = project_repo::create_project(&conn, &id, name, title, description)?;
    tracing::info!(project_id = %project.id, name, "project created");

    // First project becomes active automatically.
    let root = connection::find_git_root()?;
    let activated = match config::active_project_id(&root) {
        None => true,
        Some(ref active) => project_repo::get_project_by_id(&conn, active).is_err(),
    };
    if activated {
        config::set_active_project(&root, &project.id)?;
    }

    if json_output {
        let mut v = output::json::project_json(&project);
        v["active"] = json!(activated);
        println!("{}", output::json::render(&output::json::success(v)));
    } else {
        println!("Created project: {} ({})", project.name, project.id);
        if activated {
            println!("Activated project: {}", project.name);
        }
    }
    Ok(0)
}

fn run_list(json_output: bool) -> Result<i32, TaskboardError> {
    let conn = connection::open_db()?;
    let projects = project_repo::list_projects(&conn)?;
    let root = connection::find_git_root()?;
    let active_id = config::active_project_id(&root);

    if json_output {
        let projects_json: Vec<_> = projects
            .iter()
            .map(|p| {
                let mut v = output::json::project_json(p);
                if Some(&p.id) == active_id.as_ref() {
                    v["active"] = json!(true);
                }
                v
            })
            .collect();
        println!(
            "{}",
            output::json::render(&output::json::success(json!({ "projects": projects_json })))
        );
    } else if projects.is_empty() {
        println!("No projects found.");
    } else {
        for p in &projects {
            let marker = if Some(&p.id) == active_id.as_ref() { " *" } else { "" };
            println!("  {} ({}) - {}{}", p.name, &p.id[..std::cmp::min(8, p.id.len())], p.title, marker);
        }
    }
    Ok(0)
}

fn run_show(reference: &str, json_output: bool) -> Result<i32, TaskboardError> {
    let conn = connection::open_db()?;
    let project = project_repo::resolve_project(&conn, reference)?;
    let tasks = task_repo::list_tasks_by_project(&conn, &project.id)?;
    let snapshot = completion::aggregate(&tasks);

    if json_output {
        let tasks_json: Vec<_> = tasks.iter().map(output::json::task_summary).collect();
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "project": output::json::project_json(&project),
                "tasks": tasks_json,
                "completion": output::json::completion_json(&snapshot)
            })))
        );
    } else {
        output::text::print_project(&project);
        println!();
        output::text::print_completion(&snapshot);
        println!("\nTasks:");
        output::text::print_task_list(&tasks);
    }
    Ok(0)
}

fn run_activate(reference: &str, json_output: bool) -> Result<i32, TaskboardError> {
    let conn = connection::open_db()?;
    let project = project_repo::resolve_project(&conn, reference)?;
    let root = connection::find_git_root()?;
    config::set_active_project(&root, &project.id)?;

    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "activated": { "id": project.id, "name": project.name }
            })))
        );
    } else {
        println!("Activated project: {} ({})", project.name, project.id);
    }
    Ok(0)
}

fn run_delete(reference: &str, json_output: bool) -> Result<i32, TaskboardError> {
    let conn = connection::open_db()?;
    let project = project_repo::resolve_project(&conn, reference)?;
    project_repo::delete_project(&conn, &project.id)?;
    tracing::info!(project_id = %project.id, "project deleted");

    let root = connection::find_git_root()?;
    if config::active_project_id(&root).as_deref() == Some(project.id.as_str()) {
        config::clear_active_project(&root)?;
    }

    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "deleted": { "id": project.id, "name": project.name }
            })))
        );
    } else {
        println!("Deleted project: {} ({})", project.name, project.id);
    }
    Ok(0)
}
