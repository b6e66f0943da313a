//! OpenAPI document for the HTTP API.
//!
//! Served as JSON at `/api-docs/openapi.json` and rendered with Scalar at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Registers the bearer token scheme referenced by `security(("BearerAuth" = []))`.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Token returned by `/signup` or `/login`:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::signup,
        api::handlers::auth::login,
        api::handlers::users::get_logged_in_user,
        api::handlers::users::update_logged_in_user,
        api::handlers::users::list_users,
        api::handlers::users::get_user,
        api::handlers::users::update_user,
        api::handlers::users::delete_user,
        api::handlers::avatars::list_avatars,
        api::handlers::notes::list_own_notes,
        api::handlers::notes::list_user_notes,
        api::handlers::notes::get_note,
        api::handlers::notes::create_note,
        api::handlers::notes::update_note,
        api::handlers::notes::delete_note,
        api::handlers::tasks::list_own_tasks,
        api::handlers::tasks::list_user_tasks,
        api::handlers::tasks::get_task,
        api::handlers::tasks::create_task,
        api::handlers::tasks::update_task,
        api::handlers::tasks::delete_task,
    ),
    components(schemas(
        api::models::auth::SignupRequest,
        api::models::auth::LoginRequest,
        api::models::auth::TokenResponse,
        api::models::users::Role,
        api::models::users::SocialMedia,
        api::models::users::UserResponse,
        api::models::users::UserUpdate,
        api::models::notes::NoteCreate,
        api::models::notes::NoteUpdate,
        api::models::notes::NoteResponse,
        api::models::tasks::TaskCreate,
        api::models::tasks::TaskUpdate,
        api::models::tasks::TaskResponse,
        crate::db::models::tasks::StatusEntry,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "authentication", description = "Sign up and log in. Both return a bearer token valid for 24 hours by default."),
        (name = "profile", description = "The caller's own account."),
        (name = "notes", description = "Notes. Readable and writable by their owner and by admins."),
        (name = "tasks", description = "Tasks with an append-only status history. Readable and writable by their owner and by admins."),
        (name = "users", description = "Account administration. Admin role required."),
    ),
    info(
        title = "Notekeeper API",
        version = "1.0.0",
        description = "Notes and tasks for multiple users.

Every response uses the same envelope:

```json
{\"error\": false, \"code\": 200, \"message\": \"Note retrieved successfully\", \"data\": {}}
```

Failed requests set `error` to `true` and omit `data`.",
    ),
)]
pub struct ApiDoc;
