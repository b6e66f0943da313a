//! Storage record models.
//!
//! Each resource has a create request, an update request and a response type. Both storage
//! backends speak these types, so handlers never see which one is in use.
//!
//! - [`users`]: accounts, credential hashes and profiles
//! - [`notes`]: free-form notes owned by a user
//! - [`tasks`]: owned tasks with an append-only status history

pub mod notes;
pub mod tasks;
pub mod users;
