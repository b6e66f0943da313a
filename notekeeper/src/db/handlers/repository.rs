//! Base repository traits for storage operations.
//!
//! A repository is the data access layer for one resource kind. Every backend (Postgres,
//! in-memory) implements the same traits so the rest of the service holds them as trait
//! objects and never branches on the backend.

use crate::db::errors::Result;
use crate::db::models::{
    notes::{NoteCreateDBRequest, NoteDBResponse, NoteUpdateDBRequest},
    tasks::{TaskCreateDBRequest, TaskDBResponse, TaskUpdateDBRequest},
    users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
};
use crate::types::{NoteId, TaskId, UserId};

/// Base repository trait providing common storage operations
///
/// This trait has separate associated types for create requests, update requests, and responses.
#[async_trait::async_trait]
pub trait Repository: Send + Sync {
    /// The request type for creating entities
    type CreateRequest: Send + Sync;

    /// The request type for updating entities
    type UpdateRequest: Send + Sync;

    /// The response/DTO type returned by operations
    type Response: Send;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// The filter type for list operations
    type Filter: Send + Sync;

    /// Create a new entity
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get an entity by ID
    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// List entities matching the filter
    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Update an entity by ID. Fails with `DbError::NotFound` if it does not exist.
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;

    /// Delete an entity by ID, returning the removed record (`None` if absent)
    async fn delete(&self, id: Self::Id) -> Result<Option<Self::Response>>;
}

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub skip: i64,
    pub limit: i64,
}

impl UserFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

/// Filter for records owned by any of a set of users
#[derive(Debug, Clone)]
pub struct OwnerFilter {
    pub user_ids: Vec<UserId>,
}

impl OwnerFilter {
    pub fn new(user_id: UserId) -> Self {
        Self { user_ids: vec![user_id] }
    }

    pub fn any_of(user_ids: Vec<UserId>) -> Self {
        Self { user_ids }
    }
}

#[async_trait::async_trait]
pub trait UserRepository:
    Repository<
        CreateRequest = UserCreateDBRequest,
        UpdateRequest = UserUpdateDBRequest,
        Response = UserDBResponse,
        Id = UserId,
        Filter = UserFilter,
    >
{
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserDBResponse>>;

    /// Replace the stored credential hash and role, used when reseeding the initial admin
    async fn set_credentials(&self, id: UserId, password_hash: &str, role: crate::api::models::users::Role) -> Result<()>;
}

pub trait NoteRepository:
    Repository<
        CreateRequest = NoteCreateDBRequest,
        UpdateRequest = NoteUpdateDBRequest,
        Response = NoteDBResponse,
        Id = NoteId,
        Filter = OwnerFilter,
    >
{
}

pub trait TaskRepository:
    Repository<
        CreateRequest = TaskCreateDBRequest,
        UpdateRequest = TaskUpdateDBRequest,
        Response = TaskDBResponse,
        Id = TaskId,
        Filter = OwnerFilter,
    >
{
}
