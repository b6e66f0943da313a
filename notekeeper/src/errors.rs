use crate::api::models::response::ApiResponse;
use crate::db::errors::DbError;
use crate::types::{Operation, Resource};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

/// Why a request could not be authenticated.
///
/// Every variant renders as 401. `InvalidToken` and `TokenExpired` share a user message so
/// callers cannot tell them apart; the distinction only shows up in logs.
#[derive(ThisError, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No `Authorization` header on the request
    #[error("missing credential")]
    MissingCredential,
    /// Header present but not a `Bearer <token>` with a structurally valid token
    #[error("malformed credential")]
    MalformedCredential,
    /// Signature, algorithm or payload rejected
    #[error("invalid token")]
    InvalidToken,
    /// `exp` is not in the future, whatever the signature
    #[error("token expired")]
    TokenExpired,
    /// Email/password pair rejected at login
    #[error("invalid credentials")]
    InvalidCredentials,
}

impl AuthFailure {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthFailure::MissingCredential => "Missing Authorization header",
            AuthFailure::MalformedCredential => "Invalid token format",
            AuthFailure::InvalidToken | AuthFailure::TokenExpired => "Invalid token",
            AuthFailure::InvalidCredentials => "Invalid email or password",
        }
    }
}

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but missing or rejected
    #[error("Not authenticated: {0}")]
    Unauthenticated(#[from] AuthFailure),

    /// Caller is authenticated but may not perform the operation
    #[error("Insufficient permissions to {action} {resource}")]
    InsufficientPermissions { action: Operation, resource: Resource },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Conflict error, e.g., for unique constraint violations
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Misconfiguration detected at startup (missing signing secret, invalid settings)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Error::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Configuration { .. } | Error::Internal { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated(failure) => failure.user_message().to_string(),
            Error::InsufficientPermissions { action, resource } => {
                format!("Insufficient permissions to {action} {resource}")
            }
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Conflict { message } => message.clone(),
            Error::Configuration { .. } | Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                err @ DbError::UniqueViolation { .. } if err.is_email_conflict() => "Email already in use".to_string(),
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Configuration { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated(failure) => {
                tracing::info!(kind = ?failure, "Authentication error: {}", self);
            }
            Error::InsufficientPermissions { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
            Error::Conflict { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
        }

        ApiResponse::<()>::error(self.status_code(), self.user_message()).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
