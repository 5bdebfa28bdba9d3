pub mod connection;
pub mod migrations;
pub mod project_repo;
pub mod task_repo;
pub mod event_repo;

pub use connection::*;

/// Escape `LIKE` metacharacters so user input only matches literally.
/// Use with `ESCAPE '\'`.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
