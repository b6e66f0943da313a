//! Data persistence and access.
//!
//! Storage follows the repository pattern: each resource kind has a trait in
//! [`handlers::repository`] and every backend implements all of them.
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (api::handlers)
//! └──────┬──────┘
//!        │  Arc<dyn ...Repository>
//!        ↓
//! ┌─────────────┐
//! │    Store    │  (one repository per resource)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌──────────────────────────┐
//! │ PostgreSQL │  in-memory  │
//! └──────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: repository traits and the PostgreSQL implementations
//! - [`in_memory`]: map-backed implementations for tests and database-less runs
//! - [`models`]: request and record structures passed across the repository boundary
//! - [`errors`]: storage error type
//!
//! The PostgreSQL schema lives in `migrations/` and is applied on startup.

pub mod errors;
pub mod handlers;
pub mod in_memory;
pub mod models;

use std::sync::Arc;

use sqlx::PgPool;

use handlers::{NoteRepository, Notes, TaskRepository, Tasks, UserRepository, Users};
use in_memory::{InMemoryNotes, InMemoryTasks, InMemoryUsers};

/// One repository per resource, shared across request handlers.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub notes: Arc<dyn NoteRepository>,
    pub tasks: Arc<dyn TaskRepository>,
}

impl Store {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(Users::new(pool.clone())),
            notes: Arc::new(Notes::new(pool.clone())),
            tasks: Arc::new(Tasks::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let notes = InMemoryNotes::new();
        let tasks = InMemoryTasks::new();
        Self {
            users: Arc::new(InMemoryUsers::new(notes.clone(), tasks.clone())),
            notes: Arc::new(notes),
            tasks: Arc::new(tasks),
        }
    }
}
