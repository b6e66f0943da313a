//! API request and response data models.
//!
//! These are distinct from the storage models in [`crate::db::models`] so the wire format
//! can evolve independently. Password hashes never appear here.
//!
//! - [`auth`]: signup/login payloads and the token response
//! - [`users`]: roles, profiles and the request-scoped [`users::CurrentUser`]
//! - [`notes`], [`tasks`]: owned records and their partial updates
//! - [`response`]: the JSON envelope every endpoint answers with

pub mod auth;
pub mod notes;
pub mod response;
pub mod tasks;
pub mod users;
