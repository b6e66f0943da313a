//! API request/response models for users.

use crate::api::models::{notes::NoteResponse, tasks::TaskResponse};
use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Authorization tier carried in identity tokens
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Public profile links. Empty strings mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SocialMedia {
    pub twitter: String,
    pub linkedin: String,
    pub github: String,
    pub facebook: String,
    pub instagram: String,
    pub snapchat: String,
    pub youtube: String,
    pub pinterest: String,
    pub discord: String,
    pub website: String,
}

/// Profile update. Absent fields are left untouched; `social_media` replaces the whole set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub profile_picture: Option<String>,
    pub social_media: Option<SocialMedia>,
}

/// Query parameters for listing users. Without them every user is returned.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// Number of users to skip
    #[param(minimum = 0)]
    pub skip: Option<i64>,
    /// Maximum number of users to return
    #[param(minimum = 0)]
    pub limit: Option<i64>,
}

impl ListUsersQuery {
    /// Skip value, negative values treated as 0.
    #[inline]
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    /// Limit value, unbounded when absent and never negative.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(i64::MAX).max(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile_picture: String,
    pub social_media: SocialMedia,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<NoteResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<TaskResponse>>,
}

/// Identity of the caller, published by the authentication middleware for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            email: db.email,
            role: db.role,
            profile_picture: db.profile_picture,
            social_media: db.social_media,
            created_at: db.created_at,
            updated_at: db.updated_at,
            notes: None,
            tasks: None,
        }
    }
}

impl UserResponse {
    pub fn with_notes(mut self, notes: Vec<NoteResponse>) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<TaskResponse>) -> Self {
        self.tasks = Some(tasks);
        self
    }
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            role: db.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), json!("admin"));
        assert_eq!(serde_json::from_value::<Role>(json!("user")).unwrap(), Role::User);
        assert!(serde_json::from_value::<Role>(json!("superuser")).is_err());
    }

    #[test]
    fn test_partial_social_media_fills_defaults() {
        let social: SocialMedia = serde_json::from_value(json!({"github": "octocat"})).unwrap();
        assert_eq!(social.github, "octocat");
        assert_eq!(social.twitter, "");
    }

    #[test]
    fn test_list_query_clamps_negative_values() {
        let query = ListUsersQuery {
            skip: Some(-5),
            limit: Some(-1),
        };
        assert_eq!(query.skip(), 0);
        assert_eq!(query.limit(), 0);

        let defaults = ListUsersQuery::default();
        assert_eq!(defaults.skip(), 0);
        assert_eq!(defaults.limit(), i64::MAX);
    }
}
