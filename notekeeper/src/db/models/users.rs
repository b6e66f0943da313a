//! Database models for users.

use crate::api::models::users::{Role, SocialMedia, UserUpdate};
use crate::types::UserId;
use chrono::{DateTime, Utc};

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Database request for updating a user. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub profile_picture: Option<String>,
    pub social_media: Option<SocialMedia>,
}

impl From<UserUpdate> for UserUpdateDBRequest {
    fn from(update: UserUpdate) -> Self {
        Self {
            name: update.name,
            email: update.email,
            profile_picture: update.profile_picture,
            social_media: update.social_media,
        }
    }
}

/// Database response for a user
#[derive(Debug, Clone)]
pub struct UserDBResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub profile_picture: String,
    pub social_media: SocialMedia,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
