//! JSON envelope shared by success and error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `{"error": bool, "code": u16, "message": str, "data"?: T}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub error: bool,
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            error: false,
            code: status.as_u16(),
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::success(StatusCode::OK, message, data)
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::success(StatusCode::CREATED, message, data)
    }
}

impl ApiResponse<()> {
    /// Success without a payload, e.g. after a delete
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            error: false,
            code: StatusCode::OK.as_u16(),
            message: message.into(),
            data: None,
        }
    }

    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            error: true,
            code: status.as_u16(),
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_envelope_omits_data() {
        let body = serde_json::to_value(ApiResponse::<()>::error(StatusCode::FORBIDDEN, "nope")).unwrap();
        assert_eq!(body, json!({"error": true, "code": 403, "message": "nope"}));
    }

    #[test]
    fn test_created_envelope_status() {
        let response = ApiResponse::created("made", json!({"id": 1})).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
