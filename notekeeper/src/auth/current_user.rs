//! Request identity extraction.
//!
//! [`authenticate`] turns an `Authorization: Bearer <token>` header into a [`CurrentUser`].
//! The authentication middleware runs it once per request and stores the result in the
//! request extensions; handlers then take `CurrentUser` as an extractor.

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session::TokenService,
    errors::{AuthFailure, Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use tracing::{instrument, trace};

const BEARER_PREFIX: &str = "Bearer ";

/// A compact JWT is three non-empty base64url segments separated by dots.
fn is_compact_token(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    segments.len() == 3
        && segments
            .iter()
            .all(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'))
}

/// Validate the bearer credential on a request and return the identity it carries.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> std::result::Result<CurrentUser, AuthFailure> {
    let header = headers.get(AUTHORIZATION).ok_or(AuthFailure::MissingCredential)?;
    let value = header.to_str().map_err(|_| AuthFailure::MalformedCredential)?;
    let token = value.strip_prefix(BEARER_PREFIX).ok_or(AuthFailure::MalformedCredential)?;

    if !is_compact_token(token) {
        return Err(AuthFailure::MalformedCredential);
    }

    tokens.verify(token)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            trace!(user_id = %user.id, "identity from request extensions");
            return Ok(user.clone());
        }

        // Routes outside the authenticated group still get a full check
        let user = authenticate(&parts.headers, &state.tokens)?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
