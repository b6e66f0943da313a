use std::collections::HashMap;

use axum::extract::State;
use tracing::info;

use crate::{
    AppState,
    api::{
        extractors::{Json, Path, Query},
        handlers::{load_user, not_found_as},
        models::{
            notes::NoteResponse,
            response::ApiResponse,
            tasks::TaskResponse,
            users::{CurrentUser, ListUsersQuery, UserResponse, UserUpdate},
        },
    },
    db::{
        Store,
        handlers::{OwnerFilter, Repository, UserFilter},
        models::users::{UserDBResponse, UserUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{Resource, UserId, abbrev_uuid},
};

fn validate_update(update: &UserUpdate) -> Result<()> {
    if update.email.as_deref().is_some_and(str::is_empty) {
        return Err(Error::BadRequest {
            message: "Email cannot be empty".to_string(),
        });
    }
    Ok(())
}

async fn notes_of(store: &Store, id: UserId) -> Result<Vec<NoteResponse>> {
    let notes = store.notes.list(&OwnerFilter::new(id)).await?;
    Ok(notes.into_iter().map(NoteResponse::from).collect())
}

async fn tasks_of(store: &Store, id: UserId) -> Result<Vec<TaskResponse>> {
    let tasks = store.tasks.list(&OwnerFilter::new(id)).await?;
    Ok(tasks.into_iter().map(TaskResponse::from).collect())
}

/// Profile with every note and task the user owns
async fn full_profile(store: &Store, user: UserDBResponse) -> Result<UserResponse> {
    let id = user.id;
    Ok(UserResponse::from(user)
        .with_notes(notes_of(store, id).await?)
        .with_tasks(tasks_of(store, id).await?))
}

#[utoipa::path(
    get,
    path = "/loggedinuser",
    tag = "profile",
    summary = "Get own profile",
    responses(
        (status = 200, description = "Caller's profile with notes and tasks", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Account no longer exists"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_logged_in_user(State(state): State<AppState>, current_user: CurrentUser) -> Result<ApiResponse<UserResponse>> {
    // The token can outlive the account it was issued for
    let user = load_user(&state.store, current_user.id).await?;
    let profile = full_profile(&state.store, user).await?;
    Ok(ApiResponse::ok("User retrieved successfully", profile))
}

#[utoipa::path(
    patch,
    path = "/loggedinuser",
    tag = "profile",
    summary = "Update own profile",
    request_body = UserUpdate,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid update"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Email already in use"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_logged_in_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(update): Json<UserUpdate>,
) -> Result<ApiResponse<UserResponse>> {
    validate_update(&update)?;
    let user = state
        .store
        .users
        .update(current_user.id, &UserUpdateDBRequest::from(update))
        .await
        .map_err(not_found_as(Resource::Users, current_user.id))?;
    Ok(ApiResponse::ok("User updated successfully", UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/users/all",
    tag = "users",
    summary = "List users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Every user with their notes", body = ApiResponse<Vec<UserResponse>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<ApiResponse<Vec<UserResponse>>> {
    let filter = UserFilter::new(query.skip(), query.limit());
    let users = state.store.users.list(&filter).await?;

    // One query for the notes of the whole page
    let owners = users.iter().map(|user| user.id).collect();
    let mut notes_by_owner: HashMap<UserId, Vec<NoteResponse>> = HashMap::new();
    for note in state.store.notes.list(&OwnerFilter::any_of(owners)).await? {
        notes_by_owner.entry(note.user_id).or_default().push(NoteResponse::from(note));
    }

    let response = users
        .into_iter()
        .map(|user| {
            let notes = notes_by_owner.remove(&user.id).unwrap_or_default();
            UserResponse::from(user).with_notes(notes)
        })
        .collect();
    Ok(ApiResponse::ok("Users retrieved successfully", response))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Get user",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User with notes and tasks", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %abbrev_uuid(&id)))]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<UserId>) -> Result<ApiResponse<UserResponse>> {
    let user = load_user(&state.store, id).await?;
    let profile = full_profile(&state.store, user).await?;
    Ok(ApiResponse::ok("User retrieved successfully", profile))
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    summary = "Update user",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid update"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already in use"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %abbrev_uuid(&id)))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(update): Json<UserUpdate>,
) -> Result<ApiResponse<UserResponse>> {
    validate_update(&update)?;
    let user = state
        .store
        .users
        .update(id, &UserUpdateDBRequest::from(update))
        .await
        .map_err(not_found_as(Resource::Users, id))?;
    Ok(ApiResponse::ok("User updated successfully", UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    summary = "Delete user",
    description = "Deletes the user together with every note and task they own, and returns the removed user.",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %abbrev_uuid(&id)))]
pub async fn delete_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<UserId>,
) -> Result<ApiResponse<UserResponse>> {
    let deleted = state.store.users.delete(id).await?.ok_or_else(|| Error::NotFound {
        resource: Resource::Users.singular().to_string(),
        id: id.to_string(),
    })?;
    info!(deleted_by = %abbrev_uuid(&current_user.id), "user deleted");
    Ok(ApiResponse::ok("User deleted successfully", UserResponse::from(deleted)))
}
