use serde::{Deserialize, Serialize};

/// Derived per-project completion figures. Never stored authoritatively.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSnapshot {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub completion_percentage: f64,
    pub is_fully_completed: bool,
    pub parent_tasks_count: u64,
    pub all_tasks_count: u64,
}
