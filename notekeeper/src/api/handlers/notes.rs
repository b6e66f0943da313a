use axum::extract::State;
use tracing::info;

use crate::{
    AppState,
    api::{
        extractors::{Json, Path},
        handlers::{load_user, not_found_as},
        models::{
            notes::{NoteCreate, NoteResponse, NoteUpdate},
            response::ApiResponse,
            users::CurrentUser,
        },
    },
    auth::permissions::{authorize_owned, check_ownership_or_role},
    db::{
        handlers::{OwnerFilter, Repository},
        models::notes::{NoteCreateDBRequest, NoteUpdateDBRequest},
    },
    errors::Result,
    types::{NoteId, Operation, Resource, UserId, abbrev_uuid},
};

async fn list_for(state: &AppState, owner: UserId) -> Result<ApiResponse<Vec<NoteResponse>>> {
    let notes = state.store.notes.list(&OwnerFilter::new(owner)).await?;
    Ok(ApiResponse::ok(
        "Notes retrieved successfully",
        notes.into_iter().map(NoteResponse::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/notes/user",
    tag = "notes",
    summary = "List own notes",
    responses(
        (status = 200, description = "Notes owned by the caller", body = ApiResponse<Vec<NoteResponse>>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_own_notes(State(state): State<AppState>, current_user: CurrentUser) -> Result<ApiResponse<Vec<NoteResponse>>> {
    list_for(&state, current_user.id).await
}

#[utoipa::path(
    get,
    path = "/notes/user/{id}",
    tag = "notes",
    summary = "List a user's notes",
    params(("id" = uuid::Uuid, Path, description = "Owner's user ID")),
    responses(
        (status = 200, description = "Notes owned by the user", body = ApiResponse<Vec<NoteResponse>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither the owner nor an admin"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(owner_id = %abbrev_uuid(&owner)))]
pub async fn list_user_notes(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(owner): Path<UserId>,
) -> Result<ApiResponse<Vec<NoteResponse>>> {
    check_ownership_or_role(&current_user, owner, Operation::ReadOwn, Resource::Notes)?;
    list_for(&state, owner).await
}

#[utoipa::path(
    get,
    path = "/notes/{id}",
    tag = "notes",
    summary = "Get note",
    params(("id" = uuid::Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Note", body = ApiResponse<NoteResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither the owner nor an admin"),
        (status = 404, description = "Note not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(note_id = %abbrev_uuid(&id)))]
pub async fn get_note(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<NoteId>,
) -> Result<ApiResponse<NoteResponse>> {
    let note = authorize_owned(&*state.store.notes, id, &current_user, Operation::ReadOwn, Resource::Notes).await?;
    Ok(ApiResponse::ok("Note retrieved successfully", NoteResponse::from(note)))
}

#[utoipa::path(
    post,
    path = "/notes",
    tag = "notes",
    summary = "Create note",
    request_body = NoteCreate,
    responses(
        (status = 201, description = "Note created", body = ApiResponse<NoteResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Caller's account no longer exists"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_note(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<NoteCreate>,
) -> Result<ApiResponse<NoteResponse>> {
    // A token can outlive its account; records are never created for a missing owner
    load_user(&state.store, current_user.id).await?;

    let note = state
        .store
        .notes
        .create(&NoteCreateDBRequest {
            user_id: current_user.id,
            title: create.title,
            category: create.category,
            note: create.note,
        })
        .await?;
    info!(note_id = %abbrev_uuid(&note.id), "note created");
    Ok(ApiResponse::created("Note created successfully", NoteResponse::from(note)))
}

#[utoipa::path(
    patch,
    path = "/notes/{id}",
    tag = "notes",
    summary = "Update note",
    params(("id" = uuid::Uuid, Path, description = "Note ID")),
    request_body = NoteUpdate,
    responses(
        (status = 200, description = "Note updated", body = ApiResponse<NoteResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither the owner nor an admin"),
        (status = 404, description = "Note not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(note_id = %abbrev_uuid(&id)))]
pub async fn update_note(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<NoteId>,
    Json(update): Json<NoteUpdate>,
) -> Result<ApiResponse<NoteResponse>> {
    authorize_owned(&*state.store.notes, id, &current_user, Operation::UpdateOwn, Resource::Notes).await?;
    let note = state
        .store
        .notes
        .update(id, &NoteUpdateDBRequest::from(update))
        .await
        .map_err(not_found_as(Resource::Notes, id))?;
    Ok(ApiResponse::ok("Note updated successfully", NoteResponse::from(note)))
}

#[utoipa::path(
    delete,
    path = "/notes/{id}",
    tag = "notes",
    summary = "Delete note",
    params(("id" = uuid::Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Note deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither the owner nor an admin"),
        (status = 404, description = "Note not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(note_id = %abbrev_uuid(&id)))]
pub async fn delete_note(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<NoteId>,
) -> Result<ApiResponse<()>> {
    authorize_owned(&*state.store.notes, id, &current_user, Operation::DeleteOwn, Resource::Notes).await?;
    // Removed between the check and here: still a success from the caller's view
    state.store.notes.delete(id).await?;
    Ok(ApiResponse::message("Note deleted successfully"))
}
