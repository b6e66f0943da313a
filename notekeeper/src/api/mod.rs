//! API layer for HTTP request handling and data models.
//!
//! - **[`extractors`]**: `Json`/`Path`/`Query` whose rejections use the error envelope
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Authentication** (`/signup`, `/login`): public, issue identity tokens
//! - **Profile** (`/loggedinuser`, `/allavatar`): the caller's own account
//! - **Notes** (`/notes/*`) and **Tasks** (`/tasks/*`): owned records, guarded by ownership-or-admin
//! - **Users** (`/users/*`): admin only
//!
//! All endpoints are documented with `utoipa`; the document is served at
//! `/api-docs/openapi.json` and rendered at `/docs`.

pub mod extractors;
pub mod handlers;
pub mod models;
