use serde::{Deserialize, Serialize};

use super::CompletionSnapshot;

/// Push notification for viewers of a project.
///
/// Delivery is at-least-once: the same snapshot may be observed repeatedly, so
/// consumers key on [`StoredEvent::seq`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProjectEvent {
    #[serde(rename_all = "camelCase")]
    ProjectCompletionUpdated {
        project_id: String,
        completion: CompletionSnapshot,
    },
    #[serde(rename_all = "camelCase")]
    ProjectFullyCompleted {
        project_id: String,
        completion_stats: CompletionSnapshot,
    },
}

impl ProjectEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProjectCompletionUpdated { .. } => "projectCompletionUpdated",
            Self::ProjectFullyCompleted { .. } => "projectFullyCompleted",
        }
    }

    pub fn project_id(&self) -> &str {
        match self {
            Self::ProjectCompletionUpdated { project_id, .. }
            | Self::ProjectFullyCompleted { project_id, .. } => project_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    pub seq: i64,
    pub created_at: String,
    pub event: ProjectEvent,
}
