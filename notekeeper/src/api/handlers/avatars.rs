use std::{io::ErrorKind, path::Path};

use axum::extract::State;
use tracing::warn;

use crate::{AppState, api::models::response::ApiResponse, errors::{Error, Result}};

/// Names of the regular files in `dir`, sorted. A missing directory has no avatars.
pub(crate) async fn avatar_names(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            continue;
        }
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

#[utoipa::path(
    get,
    path = "/allavatar",
    tag = "profile",
    summary = "List avatars",
    description = "File names available under the avatar route, for use as `profile_picture`.",
    responses(
        (status = 200, description = "Avatar file names", body = ApiResponse<Vec<String>>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Unable to read directory"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_avatars(State(state): State<AppState>) -> Result<ApiResponse<Vec<String>>> {
    let dir = &state.config.avatars.dir;
    let names = avatar_names(dir).await.map_err(|e| {
        warn!(dir = %dir.display(), error = %e, "failed to read avatar directory");
        Error::Internal {
            operation: "read avatar directory".to_string(),
        }
    })?;
    Ok(ApiResponse::ok("Avatars retrieved successfully", names))
}
