use axum::extract::State;
use tracing::{info, instrument};

use crate::{
    AppState,
    api::{
        extractors::Json,
        models::{
            auth::{LoginRequest, SignupRequest, TokenResponse},
            users::Role,
        },
    },
    auth::password::{self, Argon2Params},
    db::{
        handlers::{Repository, UserRepository},
        models::users::UserCreateDBRequest,
    },
    errors::{AuthFailure, Error, Result},
    types::abbrev_uuid,
};

/// Register a new account with role `user` and return a token for it.
#[utoipa::path(
    post,
    path = "/signup",
    tag = "authentication",
    summary = "Sign up",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = TokenResponse),
        (status = 400, description = "Missing fields or password length out of bounds"),
        (status = 409, description = "Email already in use"),
    )
)]
#[instrument(skip_all)]
pub async fn signup(State(state): State<AppState>, Json(request): Json<SignupRequest>) -> Result<TokenResponse> {
    if request.name.is_empty() || request.email.is_empty() || request.password.is_empty() {
        return Err(Error::BadRequest {
            message: "Name, email, and password are required fields.".to_string(),
        });
    }

    let password_config = &state.config.auth.password;
    password::validate_length(&request.password, password_config)?;

    if state.store.users.get_user_by_email(&request.email).await?.is_some() {
        return Err(Error::Conflict {
            message: "Email already in use".to_string(),
        });
    }

    let password_hash = password::hash_password_async(request.password, Argon2Params::from(password_config)).await?;

    // A concurrent signup for the same email still fails here with a unique violation
    let user = state
        .store
        .users
        .create(&UserCreateDBRequest {
            name: request.name,
            email: request.email,
            password_hash,
            role: Role::User,
        })
        .await?;

    info!(user_id = %abbrev_uuid(&user.id), "user signed up");
    let token = state.tokens.issue(user.id, &user.email, user.role)?;
    Ok(TokenResponse {
        message: "Signup successful".to_string(),
        token,
    })
}

/// Exchange email and password for a token.
///
/// Unknown email and wrong password produce the same response.
#[utoipa::path(
    post,
    path = "/login",
    tag = "authentication",
    summary = "Log in",
    request_body = LoginRequest,
    responses(
        (status = 201, description = "Credentials accepted", body = TokenResponse),
        (status = 401, description = "Invalid email or password"),
    )
)]
#[instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<TokenResponse> {
    let Some(user) = state.store.users.get_user_by_email(&request.email).await? else {
        password::verify_against_nothing(request.password, Argon2Params::from(&state.config.auth.password)).await?;
        return Err(AuthFailure::InvalidCredentials.into());
    };

    if !password::verify_password_async(request.password, user.password_hash.clone()).await? {
        return Err(AuthFailure::InvalidCredentials.into());
    }

    let token = state.tokens.issue(user.id, &user.email, user.role)?;
    Ok(TokenResponse {
        message: "Login successfully".to_string(),
        token,
    })
}
