//! Database models for tasks.

use crate::types::{TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One entry in a task's status history: what the status became and who set it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusEntry {
    pub status: String,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct TaskCreateDBRequest {
    /// Always the authenticated caller, never taken from the payload
    pub user_id: UserId,
    pub title: String,
    pub category: String,
    pub task: String,
    pub status_history: Vec<StatusEntry>,
}

/// Field updates plus an optional history entry to append
#[derive(Debug, Clone, Default)]
pub struct TaskUpdateDBRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub task: Option<String>,
    pub append_status: Option<StatusEntry>,
}

#[derive(Debug, Clone)]
pub struct TaskDBResponse {
    pub id: TaskId,
    pub title: String,
    pub category: String,
    pub task: String,
    pub user_id: UserId,
    pub status_history: Vec<StatusEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
