use axum::extract::State;
use tracing::info;

use crate::{
    AppState,
    api::{
        extractors::{Json, Path},
        handlers::{load_user, not_found_as},
        models::{
            response::ApiResponse,
            tasks::{TaskCreate, TaskResponse, TaskUpdate},
            users::CurrentUser,
        },
    },
    auth::permissions::{authorize_owned, check_ownership_or_role},
    db::{
        handlers::{OwnerFilter, Repository},
        models::tasks::{StatusEntry, TaskCreateDBRequest, TaskUpdateDBRequest},
    },
    errors::Result,
    types::{Operation, Resource, TaskId, UserId, abbrev_uuid},
};

async fn list_for(state: &AppState, owner: UserId) -> Result<ApiResponse<Vec<TaskResponse>>> {
    let tasks = state.store.tasks.list(&OwnerFilter::new(owner)).await?;
    Ok(ApiResponse::ok(
        "Tasks retrieved successfully",
        tasks.into_iter().map(TaskResponse::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/tasks/user",
    tag = "tasks",
    summary = "List own tasks",
    responses(
        (status = 200, description = "Tasks owned by the caller", body = ApiResponse<Vec<TaskResponse>>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_own_tasks(State(state): State<AppState>, current_user: CurrentUser) -> Result<ApiResponse<Vec<TaskResponse>>> {
    list_for(&state, current_user.id).await
}

#[utoipa::path(
    get,
    path = "/tasks/user/{id}",
    tag = "tasks",
    summary = "List a user's tasks",
    params(("id" = uuid::Uuid, Path, description = "Owner's user ID")),
    responses(
        (status = 200, description = "Tasks owned by the user", body = ApiResponse<Vec<TaskResponse>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither the owner nor an admin"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(owner_id = %abbrev_uuid(&owner)))]
pub async fn list_user_tasks(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(owner): Path<UserId>,
) -> Result<ApiResponse<Vec<TaskResponse>>> {
    check_ownership_or_role(&current_user, owner, Operation::ReadOwn, Resource::Tasks)?;
    list_for(&state, owner).await
}

/// Also served at `/task/{id}`.
#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = "tasks",
    summary = "Get task",
    params(("id" = uuid::Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task with its status history", body = ApiResponse<TaskResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither the owner nor an admin"),
        (status = 404, description = "Task not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(task_id = %abbrev_uuid(&id)))]
pub async fn get_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<TaskId>,
) -> Result<ApiResponse<TaskResponse>> {
    let task = authorize_owned(&*state.store.tasks, id, &current_user, Operation::ReadOwn, Resource::Tasks).await?;
    Ok(ApiResponse::ok("Task retrieved successfully", TaskResponse::from(task)))
}

#[utoipa::path(
    post,
    path = "/tasks",
    tag = "tasks",
    summary = "Create task",
    request_body = TaskCreate,
    responses(
        (status = 201, description = "Task created", body = ApiResponse<TaskResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Caller's account no longer exists"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<TaskCreate>,
) -> Result<ApiResponse<TaskResponse>> {
    // A token can outlive its account; records are never created for a missing owner
    load_user(&state.store, current_user.id).await?;

    let task = state
        .store
        .tasks
        .create(&TaskCreateDBRequest {
            user_id: current_user.id,
            title: create.title,
            category: create.category,
            task: create.task,
            status_history: vec![StatusEntry {
                status: create.status,
                user_id: current_user.id,
            }],
        })
        .await?;
    info!(task_id = %abbrev_uuid(&task.id), "task created");
    Ok(ApiResponse::created("Task created successfully", TaskResponse::from(task)))
}

#[utoipa::path(
    patch,
    path = "/tasks/{id}",
    tag = "tasks",
    summary = "Update task",
    description = "A `status` in the body is appended to the history together with the caller's id.",
    params(("id" = uuid::Uuid, Path, description = "Task ID")),
    request_body = TaskUpdate,
    responses(
        (status = 200, description = "Task updated", body = ApiResponse<TaskResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither the owner nor an admin"),
        (status = 404, description = "Task not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(task_id = %abbrev_uuid(&id)))]
pub async fn update_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<TaskId>,
    Json(update): Json<TaskUpdate>,
) -> Result<ApiResponse<TaskResponse>> {
    authorize_owned(&*state.store.tasks, id, &current_user, Operation::UpdateOwn, Resource::Tasks).await?;

    let request = TaskUpdateDBRequest {
        title: update.title,
        category: update.category,
        task: update.task,
        append_status: update.status.map(|status| StatusEntry {
            status,
            user_id: current_user.id,
        }),
    };
    let task = state
        .store
        .tasks
        .update(id, &request)
        .await
        .map_err(not_found_as(Resource::Tasks, id))?;
    Ok(ApiResponse::ok("Task updated successfully", TaskResponse::from(task)))
}

#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    tag = "tasks",
    summary = "Delete task",
    params(("id" = uuid::Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is neither the owner nor an admin"),
        (status = 404, description = "Task not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(task_id = %abbrev_uuid(&id)))]
pub async fn delete_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<TaskId>,
) -> Result<ApiResponse<()>> {
    authorize_owned(&*state.store.tasks, id, &current_user, Operation::DeleteOwn, Resource::Tasks).await?;
    state.store.tasks.delete(id).await?;
    Ok(ApiResponse::message("Task deleted successfully"))
}
