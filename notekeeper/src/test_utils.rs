//! Shared fixtures for unit and end-to-end tests.

use std::sync::Arc;

use axum_test::TestServer;
use uuid::Uuid;

use crate::{
    AppState, Application,
    api::models::users::Role,
    auth::{
        password::{Argon2Params, hash_password},
        session::TokenService,
    },
    config::Config,
    db::{Store, handlers::Repository, models::users::{UserCreateDBRequest, UserDBResponse}},
    types::UserId,
};

pub const TEST_SECRET: &str = "test-secret-key-for-jwt";
pub const TEST_PASSWORD: &str = "correct horse battery";

pub fn create_test_config() -> Config {
    let mut config = Config {
        secret_key: Some(TEST_SECRET.to_string()),
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    };
    // Cheap hashing keeps the suite fast
    config.auth.password.argon2_memory_kib = 1024;
    config.auth.password.argon2_iterations = 1;
    config
}

pub fn create_test_state() -> AppState {
    let config = create_test_config();
    let tokens = TokenService::from_config(&config).expect("Failed to build token service");
    AppState::builder()
        .store(Store::in_memory())
        .config(config)
        .tokens(Arc::new(tokens))
        .build()
}

pub fn token_for(state: &AppState, id: UserId, role: Role) -> String {
    state
        .tokens
        .issue(id, &format!("{}@example.com", id.simple()), role)
        .expect("Failed to issue token")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Insert a user whose password is [`TEST_PASSWORD`].
pub async fn create_test_user(store: &Store, role: Role) -> UserDBResponse {
    let id = Uuid::new_v4();
    let params = Argon2Params {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    };
    let request = UserCreateDBRequest {
        name: format!("Test User {}", id.simple()),
        email: format!("testuser_{}@example.com", id.simple()),
        password_hash: hash_password(TEST_PASSWORD, params).expect("Failed to hash password"),
        role,
    };
    store.users.create(&request).await.expect("Failed to create test user")
}

/// Router over the in-memory store, plus the state so tests can seed records and mint tokens.
pub async fn create_test_app() -> (TestServer, AppState) {
    create_test_app_with_config(create_test_config()).await
}

pub async fn create_test_app_with_config(config: Config) -> (TestServer, AppState) {
    let app = Application::new(config).await.expect("Failed to create application");
    let state = app.state().clone();
    (app.into_test_server(), state)
}

pub fn auth_header(state: &AppState, user: &UserDBResponse) -> String {
    bearer(&state.tokens.issue(user.id, &user.email, user.role).expect("Failed to issue token"))
}
