//! Postgres repository for notes.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{NoteRepository, OwnerFilter, Repository},
    models::notes::{NoteCreateDBRequest, NoteDBResponse, NoteUpdateDBRequest},
};
use crate::types::{NoteId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
struct Note {
    pub id: NoteId,
    pub user_id: UserId,
    pub title: String,
    pub category: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteDBResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            category: note.category,
            note: note.note,
            user_id: note.user_id,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

pub struct Notes {
    db: PgPool,
}

impl Notes {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl Repository for Notes {
    type CreateRequest = NoteCreateDBRequest;
    type UpdateRequest = NoteUpdateDBRequest;
    type Response = NoteDBResponse;
    type Id = NoteId;
    type Filter = OwnerFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (id, user_id, title, category, note)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.title)
        .bind(&request.category)
        .bind(&request.note)
        .fetch_one(&self.db)
        .await?;

        Ok(note.into())
    }

    #[instrument(skip(self), fields(note_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        let note = sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(note.map(Into::into))
    }

    #[instrument(skip(self, filter), fields(owners = filter.user_ids.len()), err)]
    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let notes = sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE user_id = ANY($1) ORDER BY created_at ASC, id ASC")
            .bind(&filter.user_ids)
            .fetch_all(&self.db)
            .await?;

        Ok(notes.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, request), fields(note_id = %abbrev_uuid(&id)), err)]
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            UPDATE notes SET
                title = COALESCE($2, title),
                category = COALESCE($3, category),
                note = COALESCE($4, note),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.title.as_deref())
        .bind(request.category.as_deref())
        .bind(request.note.as_deref())
        .fetch_optional(&self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(note.into())
    }

    #[instrument(skip(self), fields(note_id = %abbrev_uuid(&id)), err)]
    async fn delete(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        let note = sqlx::query_as::<_, Note>("DELETE FROM notes WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(note.map(Into::into))
    }
}

impl NoteRepository for Notes {}
