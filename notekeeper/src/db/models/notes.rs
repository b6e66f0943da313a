//! Database models for notes.

use crate::api::models::notes::NoteUpdate;
use crate::types::{NoteId, UserId};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct NoteCreateDBRequest {
    /// Always the authenticated caller, never taken from the payload
    pub user_id: UserId,
    pub title: String,
    pub category: String,
    pub note: String,
}

#[derive(Debug, Clone, Default)]
pub struct NoteUpdateDBRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub note: Option<String>,
}

impl From<NoteUpdate> for NoteUpdateDBRequest {
    fn from(update: NoteUpdate) -> Self {
        Self {
            title: update.title,
            category: update.category,
            note: update.note,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoteDBResponse {
    pub id: NoteId,
    pub title: String,
    pub category: String,
    pub note: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
