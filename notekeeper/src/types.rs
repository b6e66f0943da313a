//! Common type definitions shared across the service.
//!
//! - Type aliases for entity IDs ([`UserId`], [`NoteId`], [`TaskId`])
//! - [`Resource`] and [`Operation`], used to describe denied actions in errors and logs
//! - [`abbrev_uuid`] for compact ids in traces

use std::fmt;
use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type NoteId = Uuid;
pub type TaskId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

// Operations that can be performed on resources
// *-All means any record, *-Own means restricted to records the caller owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadAll,
    ReadOwn,
    UpdateAll,
    UpdateOwn,
    DeleteAll,
    DeleteOwn,
}

// Resources that can be operated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Notes,
    Tasks,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ReadAll | Operation::ReadOwn => write!(f, "read"),
            Operation::UpdateAll | Operation::UpdateOwn => write!(f, "update"),
            Operation::DeleteAll | Operation::DeleteOwn => write!(f, "delete"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Users => write!(f, "users"),
            Resource::Notes => write!(f, "notes"),
            Resource::Tasks => write!(f, "tasks"),
        }
    }
}

impl Resource {
    /// Singular display name, used in not-found messages
    pub fn singular(&self) -> &'static str {
        match self {
            Resource::Users => "User",
            Resource::Notes => "Note",
            Resource::Tasks => "Task",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbrev_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }

    #[test]
    fn test_operation_display_collapses_scope() {
        assert_eq!(Operation::UpdateOwn.to_string(), "update");
        assert_eq!(Operation::UpdateAll.to_string(), "update");
        assert_eq!(Resource::Tasks.to_string(), "tasks");
    }
}
