//! Postgres repository implementations.
//!
//! Each repository wraps a [`sqlx::PgPool`] and implements the matching trait from
//! [`repository`]. Queries are checked at runtime (`query_as` with explicit binds) against
//! the schema in `migrations/`.
//!
//! - [`Users`]: accounts, credential lookup by email
//! - [`Notes`]: notes, listed per owner
//! - [`Tasks`]: tasks with append-only status history

pub mod notes;
pub mod repository;
pub mod tasks;
pub mod users;

pub use notes::Notes;
pub use repository::{NoteRepository, OwnerFilter, Repository, TaskRepository, UserFilter, UserRepository};
pub use tasks::Tasks;
pub use users::Users;
