//! Request extractors whose rejections render as the JSON error envelope.
//!
//! Drop-in replacements for axum's `Json`, `Path` and `Query`. A body that is not valid
//! JSON for the target type, a path id that is not a UUID, or a malformed query string
//! becomes [`Error::BadRequest`] instead of axum's plain-text rejection.

use axum::{
    extract::{
        FromRequest, FromRequestParts, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::request::Parts,
};
use tracing::debug;

use crate::errors::Error;

fn bad_request(message: &str) -> Error {
    Error::BadRequest {
        message: message.to_string(),
    }
}

/// JSON request body
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T, S> FromRequest<S> for Json<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(rejection = %rejection.body_text(), "request body rejected");
                Err(bad_request("Invalid request body"))
            }
        }
    }
}

/// Path parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct Path<T>(pub T);

impl<T, S> FromRequestParts<S> for Path<T>
where
    axum::extract::Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(rejection = %rejection.body_text(), "path parameters rejected");
                Err(bad_request("Invalid ID"))
            }
        }
    }
}

/// Query string parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

impl<T, S> FromRequestParts<S> for Query<T>
where
    axum::extract::Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(rejection = %rejection.body_text(), "query string rejected");
                Err(bad_request("Invalid query parameters"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::models::users::Role;
    use crate::test_utils::{auth_header, create_test_app, create_test_user};
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    fn assert_bad_request(body: &Value, message: &str) {
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], 400);
        assert_eq!(body["message"], message);
    }

    #[test_log::test(tokio::test)]
    async fn test_malformed_body_renders_envelope() {
        let (app, state) = create_test_app().await;
        let user = create_test_user(&state.store, Role::User).await;

        let response = app
            .post("/notes")
            .add_header("authorization", auth_header(&state, &user))
            .bytes("{not json".into())
            .content_type("application/json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_bad_request(&response.json(), "Invalid request body");
    }

    #[test_log::test(tokio::test)]
    async fn test_wrongly_typed_body_renders_envelope() {
        let (app, _) = create_test_app().await;

        let response = app.post("/login").json(&json!({"email": 42, "password": []})).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_bad_request(&response.json(), "Invalid request body");
    }

    #[test_log::test(tokio::test)]
    async fn test_non_uuid_id_renders_envelope() {
        let (app, state) = create_test_app().await;
        let user = create_test_user(&state.store, Role::User).await;
        let admin = create_test_user(&state.store, Role::Admin).await;

        let response = app.get("/notes/not-a-uuid").add_header("authorization", auth_header(&state, &user)).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_bad_request(&response.json(), "Invalid ID");

        let response = app.delete("/users/42").add_header("authorization", auth_header(&state, &admin)).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_bad_request(&response.json(), "Invalid ID");
    }

    #[test_log::test(tokio::test)]
    async fn test_malformed_query_renders_envelope() {
        let (app, state) = create_test_app().await;
        let admin = create_test_user(&state.store, Role::Admin).await;

        let response = app
            .get("/users/all?limit=lots")
            .add_header("authorization", auth_header(&state, &admin))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_bad_request(&response.json(), "Invalid query parameters");
    }
}
