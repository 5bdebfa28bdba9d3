use serde_json::json;

use crate::cli::resolve_project_id;
use crate::db::{connection, project_repo};
use crate::error::TaskboardError;
use crate::output;
use crate::workflow::status;

pub fn run(json_output: bool, project_flag: Option<&str>) -> i32 {
    super::finish(run_inner(json_output, project_flag), json_output)
}

fn run_inner(json_output: bool, project_flag: Option<&str>) -> Result<i32, TaskboardError> {
    let conn = connection::open_db()?;
    let project_id = resolve_project_id(&conn, project_flag)?;
    let project = project_repo::get_project_by_id(&conn, &project_id)?;
    let snapshot = status::project_completion(&conn, &project_id)?;

    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "projectId": project.id,
                "completion": output::json::completion_json(&snapshot)
            })))
        );
    } else {
        println!("Project: {} ({})", project.name, project.id);
        output::text::print_completion(&snapshot);
    }
    Ok(0)
}
