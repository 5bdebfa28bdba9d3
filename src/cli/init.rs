use serde_json::json;

use crate::db::connection;
use crate::output;

pub fn run(json_output: bool) -> i32 {
    match connection::init_db() {
        Ok(path) => {
            if json_output {
                println!(
                    "{}",
                    output::json::render(&output::json::success(json!({
                        "path": path.to_string_lossy()
                    })))
                );
            } else {
                println!("Initialized taskboard at {}", path.display());
            }
            0
        }
        Err(e) => super::report_error(&e, json_output),
    }
}
