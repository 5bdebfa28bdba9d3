use serde_json::json;

use crate::cli::resolve_project_id;
use crate::db::{connection, event_repo};
use crate::error::TaskboardError;
use crate::output;

pub fn run(since: i64, json_output: bool, project_flag: Option<&str>) -> i32 {
    super::finish(run_inner(since, json_output, project_flag), json_output)
}

fn run_inner(since: i64, json_output: bool, project_flag: Option<&str>) -> Result<i32, TaskboardError> {
    let conn = connection::open_db()?;
    let project_id = resolve_project_id(&conn, project_flag)?;
    let events = event_repo::list_events(&conn, &project_id, since)?;

    if json_output {
        let last_seq = events.last().map_or(since, |e| e.seq);
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "events": events.iter().map(output::json::event_json).collect::<Vec<_>>(),
                "lastSeq": last_seq
            })))
        );
    } else {
        output::text::print_events(&events);
    }
    Ok(0)
}
