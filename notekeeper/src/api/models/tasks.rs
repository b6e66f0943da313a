//! API request/response models for tasks.

use crate::db::models::tasks::{StatusEntry, TaskDBResponse};
use crate::types::{TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct TaskCreate {
    pub title: String,
    pub category: String,
    pub task: String,
    /// Initial status, recorded as the first history entry
    pub status: String,
}

/// Partial update. A present `status` is appended to the history together with the caller's id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub category: Option<String>,
    pub task: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TaskId,
    pub title: String,
    pub category: String,
    pub task: String,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub status_history: Vec<StatusEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TaskDBResponse> for TaskResponse {
    fn from(db: TaskDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            category: db.category,
            task: db.task,
            user_id: db.user_id,
            status_history: db.status_history,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
