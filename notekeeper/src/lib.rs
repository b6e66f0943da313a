//! # notekeeper: notes and tasks for many users
//!
//! `notekeeper` is an HTTP service where users keep notes and tasks. Every record belongs to
//! the account that created it; owners and admins may read and change it, nobody else may.
//!
//! ## Architecture
//!
//! The service is built on [Axum](https://github.com/tokio-rs/axum). Records live in
//! PostgreSQL when `database.url` is configured and in process memory otherwise, behind the
//! same repository traits ([`db`]).
//!
//! ### Request Flow
//!
//! Clients obtain a signed bearer token from `/signup` or `/login`. Protected routes sit in
//! two groups:
//!
//! - **authenticated** (`/loggedinuser`, `/allavatar`, `/notes/*`, `/tasks/*`): the
//!   [`auth::middleware::require_authentication`] layer verifies the token and publishes the
//!   caller's identity before any handler runs. Handlers that touch a single note or task load
//!   it and apply the ownership-or-admin rule ([`auth::permissions::authorize_owned`]).
//! - **admin** (`/users/*`): the same layer, followed by [`auth::middleware::admin_only`].
//!
//! Authentication failures answer 401, authorization failures 403 and missing records 404,
//! all in the JSON envelope described in [`api::models::response`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use notekeeper::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = notekeeper::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     notekeeper::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See [`config`] for the YAML layout and environment overrides. The only required setting is
//! the token signing secret (`secret_key`, or `JWT_SECRET` in the environment); without it the
//! service refuses to start.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::models::users::Role,
    auth::{
        middleware::{admin_only, require_authentication},
        password::{self, Argon2Params},
        session::TokenService,
    },
    config::{CorsOrigin, PasswordConfig},
    db::{
        Store,
        handlers::{Repository, UserRepository},
        models::users::UserCreateDBRequest,
    },
    errors::Error,
    openapi::ApiDoc,
};
use axum::{
    Json, Router,
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{NoteId, TaskId, UserId};

/// Shared state handed to every handler and middleware.
///
/// - `store`: repositories for users, notes and tasks
/// - `config`: the validated configuration
/// - `tokens`: signs and verifies identity tokens with the process-wide secret
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: Store,
    pub config: Config,
    pub tokens: Arc<TokenService>,
}

/// Get the notekeeper database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user, or refresh it if the email is already registered.
///
/// An existing account gets the configured password and the admin role, so restarting with
/// new credentials always leaves a working admin login.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(
    email: &str,
    password: &str,
    store: &Store,
    password_config: &PasswordConfig,
) -> Result<UserId, Error> {
    let password_hash = password::hash_password_async(password.to_string(), Argon2Params::from(password_config)).await?;

    if let Some(existing) = store.users.get_user_by_email(email).await? {
        store.users.set_credentials(existing.id, &password_hash, Role::Admin).await?;
        info!(user_id = %types::abbrev_uuid(&existing.id), "Refreshed initial admin user");
        return Ok(existing.id);
    }

    let created = store
        .users
        .create(&UserCreateDBRequest {
            name: "Admin".to_string(),
            email: email.to_string(),
            password_hash,
            role: Role::Admin,
        })
        .await?;
    info!(user_id = %types::abbrev_uuid(&created.id), "Created initial admin user");
    Ok(created.id)
}

/// Connect to PostgreSQL and run migrations when a URL is configured, else keep records in memory.
async fn setup_store(config: &Config) -> anyhow::Result<(Store, Option<PgPool>)> {
    let Some(url) = config.database.url.as_deref() else {
        info!("No database configured, records are kept in memory");
        return Ok((Store::in_memory(), None));
    };

    info!("Using external database");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(url)
        .await?;
    migrator().run(&pool).await?;

    Ok((Store::postgres(pool.clone()), Some(pool)))
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors = &config.auth.security.cors;

    // A literal "*" in an origin list is rejected by tower-http
    let allow_origin = if cors.allowed_origins.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.origin().ascii_serialization().parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut exposed = Vec::with_capacity(cors.exposed_headers.len());
    for name in &cors.exposed_headers {
        exposed.push(name.parse::<HeaderName>()?);
    }

    let mut layer = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(cors.allow_credentials)
        .expose_headers(exposed);

    if let Some(max_age) = cors.max_age {
        layer = layer.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(layer)
}

/// Build the main application router with all endpoints and middleware.
///
/// Route groups:
/// - public: signup, login, health, API docs and the avatar files
/// - authenticated: profile, avatar listing, notes and tasks
/// - admin: user administration
///
/// Every route is wrapped in the request timeout, CORS and tracing layers.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    use api::handlers::{auth, avatars, notes, tasks, users};

    let public_routes = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state.clone());

    let authenticated_routes = Router::new()
        .route("/loggedinuser", get(users::get_logged_in_user).patch(users::update_logged_in_user))
        .route("/allavatar", get(avatars::list_avatars))
        .route("/notes", post(notes::create_note))
        .route("/notes/user", get(notes::list_own_notes))
        .route("/notes/user/{id}", get(notes::list_user_notes))
        .route("/notes/{id}", get(notes::get_note).patch(notes::update_note).delete(notes::delete_note))
        .route("/tasks", post(tasks::create_task))
        .route("/tasks/user", get(tasks::list_own_tasks))
        .route("/tasks/user/{id}", get(tasks::list_user_tasks))
        .route("/tasks/{id}", get(tasks::get_task).patch(tasks::update_task).delete(tasks::delete_task))
        .route("/task/{id}", get(tasks::get_task))
        .route_layer(from_fn_with_state(state.clone(), require_authentication))
        .with_state(state.clone());

    // Layers run bottom to top: authenticate, then require the admin role
    let admin_routes = Router::new()
        .route("/users/all", get(users::list_users))
        .route("/users/{id}", get(users::get_user).patch(users::update_user).delete(users::delete_user))
        .route_layer(from_fn(admin_only))
        .route_layer(from_fn_with_state(state.clone(), require_authentication))
        .with_state(state.clone());

    let avatars = &state.config.avatars;
    let router = Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(admin_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .nest_service(&avatars.route, ServeDir::new(&avatars.dir))
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, state.config.request_timeout))
        .layer(create_cors_layer(&state.config)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// The assembled service.
///
/// 1. **Create**: [`Application::new`] builds the token service, connects the store, seeds
///    the initial admin and builds the router
/// 2. **Serve**: [`Application::serve`] binds to `host:port` and handles requests until the
///    shutdown future resolves
pub struct Application {
    router: Router,
    app_state: AppState,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;
        // Refuse to start without a signing secret
        let tokens = TokenService::from_config(&config)?;

        let (store, pool) = setup_store(&config).await?;

        if let (Some(email), Some(password)) = (config.admin_email.as_deref(), config.admin_password.as_deref()) {
            create_initial_admin_user(email, password, &store, &config.auth.password)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {}", e))?;
        }

        let app_state = AppState::builder()
            .store(store)
            .config(config.clone())
            .tokens(Arc::new(tokens))
            .build();

        let router = build_router(&app_state)?;

        Ok(Self {
            router,
            app_state,
            config,
            pool,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.app_state
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Notekeeper listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{Application, create_initial_admin_user};
    use crate::{
        api::models::{auth::TokenResponse, response::ApiResponse, notes::NoteResponse, users::Role},
        auth::session::TokenService,
        config::CorsOrigin,
        db::{
            Store,
            handlers::{Repository, UserRepository},
        },
        test_utils::*,
    };
    use axum::http::{HeaderValue, StatusCode, header};
    use serde_json::{Value, json};
    use std::time::Duration;
    use uuid::Uuid;

    #[test_log::test(tokio::test)]
    async fn test_healthz() {
        let (app, _) = create_test_app().await;

        let response = app.get("/healthz").await;

        response.assert_status_ok();
        response.assert_text("OK");
    }

    #[test_log::test(tokio::test)]
    async fn test_openapi_json_endpoint() {
        let (app, _) = create_test_app().await;

        let response = app.get("/api-docs/openapi.json").await;

        response.assert_status_ok();
        let doc: Value = response.json();
        assert!(doc["paths"]["/notes/{id}"].is_object());
        assert!(doc["paths"]["/users/all"].is_object());
        assert!(doc["components"]["securitySchemes"]["BearerAuth"].is_object());

        app.get("/docs").await.assert_status_ok();
    }

    #[test_log::test(tokio::test)]
    async fn test_application_requires_signing_secret() {
        let mut config = create_test_config();
        config.secret_key = None;

        assert!(Application::new(config).await.is_err());
    }

    /// A user reaches their own record and is refused someone else's.
    #[test_log::test(tokio::test)]
    async fn test_ownership_end_to_end() {
        let (app, state) = create_test_app().await;
        let first = create_test_user(&state.store, Role::User).await;
        let second = create_test_user(&state.store, Role::User).await;

        let theirs: ApiResponse<NoteResponse> = app
            .post("/notes")
            .add_header("authorization", auth_header(&state, &second))
            .json(&json!({"title": "second's"}))
            .await
            .json();
        let mine: ApiResponse<NoteResponse> = app
            .post("/notes")
            .add_header("authorization", auth_header(&state, &first))
            .json(&json!({"title": "first's"}))
            .await
            .json();

        let token = token_for(&state, first.id, Role::User);
        app.get(&format!("/notes/{}", theirs.data.unwrap().id))
            .add_header("authorization", bearer(&token))
            .await
            .assert_status_forbidden();
        app.get(&format!("/notes/{}", mine.data.unwrap().id))
            .add_header("authorization", bearer(&token))
            .await
            .assert_status_ok();
    }

    #[test_log::test(tokio::test)]
    async fn test_authentication_failures_stop_before_handlers() {
        let (app, _) = create_test_app().await;
        let any_note = format!("/notes/{}", Uuid::new_v4());

        let malformed = app.get(&any_note).add_header("authorization", "Bearer not-a-token").await;
        malformed.assert_status_unauthorized();
        let body: Value = malformed.json();
        assert_eq!(body["message"], "Invalid token format");

        let missing = app.get(&any_note).await;
        missing.assert_status_unauthorized();
        let body: Value = missing.json();
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], 401);
        assert_eq!(body["message"], "Missing Authorization header");

        // Would be a 404 if the handler had run
        let wrong_scheme = app.get(&any_note).add_header("authorization", "Basic dXNlcjpwYXNz").await;
        wrong_scheme.assert_status_unauthorized();
    }

    #[test_log::test(tokio::test)]
    async fn test_expired_and_forged_tokens_rejected() {
        let (app, state) = create_test_app().await;
        let user = create_test_user(&state.store, Role::User).await;

        let expired = TokenService::new(TEST_SECRET, Duration::ZERO)
            .unwrap()
            .issue(user.id, &user.email, user.role)
            .unwrap();
        let response = app.get("/loggedinuser").add_header("authorization", bearer(&expired)).await;
        response.assert_status_unauthorized();
        let body: Value = response.json();
        assert_eq!(body["message"], "Invalid token");

        let forged = TokenService::new("some-other-secret", Duration::from_secs(3600))
            .unwrap()
            .issue(user.id, &user.email, Role::Admin)
            .unwrap();
        let response = app.get("/users/all").add_header("authorization", bearer(&forged)).await;
        response.assert_status_unauthorized();
        let body: Value = response.json();
        assert_eq!(body["message"], "Invalid token");
    }

    #[test_log::test(tokio::test)]
    async fn test_signup_then_use_token() {
        let (app, _) = create_test_app().await;

        let signup: TokenResponse = app
            .post("/signup")
            .json(&json!({"name": "Grace", "email": "grace@example.com", "password": "cobol-rules"}))
            .await
            .json();

        let response = app.get("/loggedinuser").add_header("authorization", bearer(&signup.token)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["email"], "grace@example.com");
        assert_eq!(body["data"]["role"], "user");

        // Signed-up users are not admins
        app.get("/users/all")
            .add_header("authorization", bearer(&signup.token))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[test_log::test(tokio::test)]
    async fn test_initial_admin_seeded_and_can_log_in() {
        let mut config = create_test_config();
        config.admin_email = Some("root@example.com".to_string());
        config.admin_password = Some("bootstrap-pass".to_string());
        let (app, state) = create_test_app_with_config(config).await;

        let login = app
            .post("/login")
            .json(&json!({"email": "root@example.com", "password": "bootstrap-pass"}))
            .await;
        login.assert_status(StatusCode::CREATED);
        let body: TokenResponse = login.json();

        app.get("/users/all")
            .add_header("authorization", bearer(&body.token))
            .await
            .assert_status_ok();

        let admin = state.store.users.get_user_by_email("root@example.com").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
    }

    #[test_log::test(tokio::test)]
    async fn test_create_initial_admin_user_refreshes_existing() {
        let store = Store::in_memory();
        let config = create_test_config();
        let existing = create_test_user(&store, Role::User).await;

        let id = create_initial_admin_user(&existing.email, "new-admin-pass", &store, &config.auth.password)
            .await
            .unwrap();

        assert_eq!(id, existing.id);
        let refreshed = store.users.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(refreshed.role, Role::Admin);
        assert_ne!(refreshed.password_hash, existing.password_hash);
        assert!(crate::auth::password::verify_password("new-admin-pass", &refreshed.password_hash).unwrap());
    }

    #[test_log::test(tokio::test)]
    async fn test_create_initial_admin_user_new_user() {
        let store = Store::in_memory();
        let config = create_test_config();

        let id = create_initial_admin_user("fresh@example.com", "admin-pass", &store, &config.auth.password)
            .await
            .unwrap();

        let user = store.users.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.email, "fresh@example.com");
        assert_eq!(user.role, Role::Admin);
    }

    #[test_log::test(tokio::test)]
    async fn test_cors_wildcard_preflight() {
        let (app, _) = create_test_app().await;

        let response = app
            .method(axum::http::Method::OPTIONS, "/notes")
            .add_header("origin", "https://app.example.com")
            .add_header("access-control-request-method", "POST")
            .add_header("access-control-request-headers", "authorization")
            .await;

        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            HeaderValue::from_static("*")
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_cors_explicit_origin() {
        let mut config = create_test_config();
        config.auth.security.cors.allowed_origins = vec![CorsOrigin::Url("https://app.example.com".parse().unwrap())];
        config.auth.security.cors.allow_credentials = true;
        let (app, _) = create_test_app_with_config(config).await;

        let allowed = app.get("/healthz").add_header("origin", "https://app.example.com").await;
        assert_eq!(
            allowed.header(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            HeaderValue::from_static("https://app.example.com")
        );

        let other = app.get("/healthz").add_header("origin", "https://evil.example.com").await;
        assert!(other.maybe_header(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_unknown_route_is_not_found() {
        let (app, _) = create_test_app().await;

        app.get("/nope").await.assert_status_not_found();
    }
}
