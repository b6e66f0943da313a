use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    auth::{current_user::authenticate, permissions::require_role},
    errors::{AuthFailure, Error},
    types::{Operation, Resource, abbrev_uuid},
};
use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use tracing::{debug, trace};

/// Validate the bearer token and publish the caller's identity into the request extensions.
/// On failure the request never reaches a handler.
pub(crate) fn authenticate_request(state: &AppState, mut request: Request) -> Result<Request, Error> {
    let user = authenticate(request.headers(), &state.tokens).inspect_err(|failure| {
        debug!(kind = ?failure, path = %request.uri().path(), "rejecting unauthenticated request");
    })?;

    trace!(user_id = %abbrev_uuid(&user.id), role = %user.role, "request authenticated");
    request.extensions_mut().insert(user);
    Ok(request)
}

/// Admin routes act on arbitrary user records, so the denied operation is the `*All` variant.
fn admin_operation(method: &Method) -> Operation {
    match *method {
        Method::PATCH | Method::PUT | Method::POST => Operation::UpdateAll,
        Method::DELETE => Operation::DeleteAll,
        _ => Operation::ReadAll,
    }
}

/// Require the identity published by [`require_authentication`] to hold the admin role.
pub(crate) fn authorize_admin(request: &Request) -> Result<(), Error> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or(Error::Unauthenticated(AuthFailure::MissingCredential))?;

    require_role(user, Role::Admin, admin_operation(request.method()), Resource::Users)
}

pub async fn require_authentication(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, Error> {
    let request = authenticate_request(&state, request)?;
    Ok(next.run(request).await)
}

/// Must be layered inside [`require_authentication`].
pub async fn admin_only(request: Request, next: Next) -> Result<Response, Error> {
    authorize_admin(&request)?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_state, token_for};
    use axum::{body::Body, http::header::AUTHORIZATION};
    use uuid::Uuid;

    fn request(method: Method, authorization: Option<String>) -> Request {
        let mut builder = Request::builder().method(method).uri("/users/all");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_authenticated_request_carries_identity() {
        let state = create_test_state();
        let id = Uuid::new_v4();
        let token = token_for(&state, id, Role::User);

        let request = authenticate_request(&state, request(Method::GET, Some(format!("Bearer {token}")))).unwrap();
        let user = request.extensions().get::<CurrentUser>().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn test_failures_short_circuit_with_kind() {
        let state = create_test_state();

        let err = authenticate_request(&state, request(Method::GET, None)).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated(AuthFailure::MissingCredential)));

        let err = authenticate_request(&state, request(Method::GET, Some("Bearer not-a-token".to_string()))).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated(AuthFailure::MalformedCredential)));
        assert_eq!(err.status_code().as_u16(), 401);
    }

    #[test]
    fn test_admin_check() {
        let state = create_test_state();

        let user_token = token_for(&state, Uuid::new_v4(), Role::User);
        let user_request = authenticate_request(&state, request(Method::DELETE, Some(format!("Bearer {user_token}")))).unwrap();
        let err = authorize_admin(&user_request).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientPermissions {
                action: Operation::DeleteAll,
                resource: Resource::Users
            }
        ));

        let admin_token = token_for(&state, Uuid::new_v4(), Role::Admin);
        let admin_request = authenticate_request(&state, request(Method::GET, Some(format!("Bearer {admin_token}")))).unwrap();
        assert!(authorize_admin(&admin_request).is_ok());
    }

    #[test]
    fn test_admin_check_without_identity_is_unauthenticated() {
        let err = authorize_admin(&request(Method::GET, None)).unwrap_err();
        assert_eq!(err.status_code().as_u16(), 401);
    }

    #[test_log::test(tokio::test)]
    async fn test_layers_run_authentication_before_role_check() {
        use axum::{Router, http::StatusCode, middleware::{from_fn, from_fn_with_state}, routing::get};
        use tower::ServiceExt;

        let state = create_test_state();
        let router = Router::new()
            .route("/users/all", get(|| async { "listed" }))
            .route_layer(from_fn(admin_only))
            .route_layer(from_fn_with_state(state.clone(), require_authentication));

        let anonymous = router.clone().oneshot(request(Method::GET, None)).await.unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let user_token = token_for(&state, Uuid::new_v4(), Role::User);
        let user = router
            .clone()
            .oneshot(request(Method::GET, Some(format!("Bearer {user_token}"))))
            .await
            .unwrap();
        assert_eq!(user.status(), StatusCode::FORBIDDEN);

        let admin_token = token_for(&state, Uuid::new_v4(), Role::Admin);
        let admin = router
            .oneshot(request(Method::GET, Some(format!("Bearer {admin_token}"))))
            .await
            .unwrap();
        assert_eq!(admin.status(), StatusCode::OK);
    }
}
