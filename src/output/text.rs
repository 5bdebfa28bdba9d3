use crate::models::{CompletionSnapshot, Project, StoredEvent, Task};
use crate::workflow::board::Board;

fn short_id(id: &str) -> &str {
    &id[..std::cmp::min(8, id.len())]
}

fn priority_label(t: &Task) -> &'static str {
    t.priority.map_or("-", |p| p.as_str())
}

pub fn print_project(p: &Project) {
    println!("Project: {} ({})", p.name, p.id);
    println!("  Title: {}", p.title);
    if let Some(ref desc) = p.description {
        println!("  Description: {desc}");
    }
    println!("  Created: {}", p.created_at);
}

pub fn print_task(t: &Task) {
    println!("Task: {} ({})", t.title, t.id);
    if let Some(ref desc) = t.description {
        println!("  Description: {desc}");
    }
    let lock = if t.is_locked() { " [locked]" } else { "" };
    println!("  Status: {}{lock}", t.status.as_str());
    println!("  Priority: {}", priority_label(t));
    if let Some(ref parent) = t.parent_task_id {
        println!("  Parent: {parent}");
    }
    if let Some(ref due) = t.due_date {
        println!("  Due: {due}");
    }
    if let Some(ref completed) = t.completed_at {
        println!("  Completed: {completed}");
    }
}

pub fn print_task_list(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    for t in tasks {
        let indent = if t.is_top_level() { "" } else { "  " };
        println!(
            "  {indent}[{}] {} ({}) p={}{}",
            t.status.as_str(),
            t.title,
            short_id(&t.id),
            priority_label(t),
            t.due_date.as_ref().map(|d| format!(" due={d}")).unwrap_or_default()
        );
    }
}

pub fn print_completion(c: &CompletionSnapshot) {
    println!(
        "Completion: {:.1}% ({}/{} top-level tasks, {} tasks total)",
        c.completion_percentage, c.completed_tasks, c.total_tasks, c.all_tasks_count
    );
    if c.is_fully_completed {
        println!("Project fully completed!");
    }
}

pub fn print_board(board: &Board) {
    for (status, tasks) in board.columns() {
        println!("== {} ({}) ==", status.as_str(), tasks.len());
        for t in tasks {
            let lock = if t.is_locked() { " [locked]" } else { "" };
            println!("  {} ({}) p={}{lock}", t.title, short_id(&t.id), priority_label(t));
        }
    }
}

pub fn print_events(events: &[StoredEvent]) {
    if events.is_empty() {
        println!("No events.");
        return;
    }
    for e in events {
        println!("  #{} {} {}", e.seq, e.created_at, e.event.kind());
    }
}
