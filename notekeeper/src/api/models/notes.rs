//! API request/response models for notes.

use crate::db::models::notes::NoteDBResponse;
use crate::types::{NoteId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct NoteCreate {
    pub title: String,
    pub category: String,
    pub note: String,
}

/// Partial update: `None` keeps the stored value, `Some("")` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub category: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: NoteId,
    pub title: String,
    pub category: String,
    pub note: String,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NoteDBResponse> for NoteResponse {
    fn from(db: NoteDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            category: db.category,
            note: db.note,
            user_id: db.user_id,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
