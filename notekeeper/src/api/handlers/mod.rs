//! HTTP request handlers.
//!
//! Every handler returns [`ApiResponse`](crate::api::models::response::ApiResponse) on success
//! and [`Error`](crate::errors::Error) on failure, so both render as the same JSON envelope.

pub mod auth;
pub mod avatars;
pub mod notes;
pub mod tasks;
pub mod users;

use crate::{
    db::{Store, errors::DbError, handlers::Repository, models::users::UserDBResponse},
    errors::{Error, Result},
    types::{Resource, UserId},
};

/// Turn a storage-level not-found into a resource-specific 404.
pub(crate) fn not_found_as(resource: Resource, id: uuid::Uuid) -> impl FnOnce(DbError) -> Error {
    move |err| match err {
        DbError::NotFound => Error::NotFound {
            resource: resource.singular().to_string(),
            id: id.to_string(),
        },
        other => Error::Database(other),
    }
}

/// Fetch a user, 404 if the account does not exist (or no longer does).
pub(crate) async fn load_user(store: &Store, id: UserId) -> Result<UserDBResponse> {
    store.users.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: Resource::Users.singular().to_string(),
        id: id.to_string(),
    })
}
