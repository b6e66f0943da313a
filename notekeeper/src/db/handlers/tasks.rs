//! Postgres repository for tasks.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{OwnerFilter, Repository, TaskRepository},
    models::tasks::{StatusEntry, TaskCreateDBRequest, TaskDBResponse, TaskUpdateDBRequest},
};
use crate::types::{TaskId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub title: String,
    pub category: String,
    pub task: String,
    pub status_history: Json<Vec<StatusEntry>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskDBResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            category: task.category,
            task: task.task,
            user_id: task.user_id,
            status_history: task.status_history.0,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

pub struct Tasks {
    db: PgPool,
}

impl Tasks {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl Repository for Tasks {
    type CreateRequest = TaskCreateDBRequest;
    type UpdateRequest = TaskUpdateDBRequest;
    type Response = TaskDBResponse;
    type Id = TaskId;
    type Filter = OwnerFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, user_id, title, category, task, status_history)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.title)
        .bind(&request.category)
        .bind(&request.task)
        .bind(Json(request.status_history.clone()))
        .fetch_one(&self.db)
        .await?;

        Ok(task.into())
    }

    #[instrument(skip(self), fields(task_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(task.map(Into::into))
    }

    #[instrument(skip(self, filter), fields(owners = filter.user_ids.len()), err)]
    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let tasks = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE user_id = ANY($1) ORDER BY created_at ASC, id ASC")
            .bind(&filter.user_ids)
            .fetch_all(&self.db)
            .await?;

        Ok(tasks.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, request), fields(task_id = %abbrev_uuid(&id)), err)]
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // History is append-only: the new entry is concatenated in the same statement
        let appended = request.append_status.as_ref().map(|entry| Json(vec![entry.clone()]));

        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks SET
                title = COALESCE($2, title),
                category = COALESCE($3, category),
                task = COALESCE($4, task),
                status_history = status_history || COALESCE($5, '[]'::jsonb),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.title.as_deref())
        .bind(request.category.as_deref())
        .bind(request.task.as_deref())
        .bind(appended)
        .fetch_optional(&self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(task.into())
    }

    #[instrument(skip(self), fields(task_id = %abbrev_uuid(&id)), err)]
    async fn delete(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        let task = sqlx::query_as::<_, Task>("DELETE FROM tasks WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(task.map(Into::into))
    }
}

impl TaskRepository for Tasks {}
