use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request to register a new user
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    /// Password (will be hashed)
    pub password: String,
}

/// Request to login
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response after successful login or signup
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub message: String,
    /// Bearer token for the `Authorization` header
    pub token: String,
}

// Login and signup both answer 201
impl IntoResponse for TokenResponse {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self)).into_response()
    }
}
