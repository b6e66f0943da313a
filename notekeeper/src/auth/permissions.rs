//! Authorization rules.
//!
//! Two checks cover every route:
//!
//! - [`require_role`] gates whole route groups on the caller's role.
//! - [`authorize_owned`] loads a record through its repository and allows the caller when
//!   they own it or are an admin. A missing record is always `NotFound`, whoever asks.
//!
//! The ownership rule works for any record type implementing [`OwnedResource`].

use crate::{
    api::models::users::{CurrentUser, Role},
    db::{
        handlers::Repository,
        models::{notes::NoteDBResponse, tasks::TaskDBResponse, users::UserDBResponse},
    },
    errors::{Error, Result},
    types::{Operation, Resource, UserId, abbrev_uuid},
};
use tracing::{debug, instrument};

/// A persisted record with a single owning user.
pub trait OwnedResource {
    fn owner_id(&self) -> UserId;
}

impl OwnedResource for NoteDBResponse {
    fn owner_id(&self) -> UserId {
        self.user_id
    }
}

impl OwnedResource for TaskDBResponse {
    fn owner_id(&self) -> UserId {
        self.user_id
    }
}

/// A user record is owned by that user.
impl OwnedResource for UserDBResponse {
    fn owner_id(&self) -> UserId {
        self.id
    }
}

pub fn has_role(user: &CurrentUser, required: Role) -> bool {
    user.role == required
}

/// Deny with `InsufficientPermissions` unless the caller holds `required`.
pub fn require_role(user: &CurrentUser, required: Role, action: Operation, resource: Resource) -> Result<()> {
    if has_role(user, required) {
        Ok(())
    } else {
        debug!(user_id = %abbrev_uuid(&user.id), role = %user.role, %required, "role check failed");
        Err(Error::InsufficientPermissions { action, resource })
    }
}

/// The ownership-or-admin rule.
pub fn can_access(user: &CurrentUser, owner_id: UserId) -> bool {
    has_role(user, Role::Admin) || user.id == owner_id
}

pub fn check_ownership_or_role(user: &CurrentUser, owner_id: UserId, action: Operation, resource: Resource) -> Result<()> {
    if can_access(user, owner_id) {
        Ok(())
    } else {
        debug!(
            user_id = %abbrev_uuid(&user.id),
            owner_id = %abbrev_uuid(&owner_id),
            "ownership check failed"
        );
        Err(Error::InsufficientPermissions { action, resource })
    }
}

/// Load `id` from `repo` and return it if the caller may act on it.
///
/// Lookup happens first: an absent record yields `NotFound` even for callers who would be
/// denied, so existence never leaks through a different status.
#[instrument(skip(repo, user), fields(user_id = %abbrev_uuid(&user.id), %resource, %action), err)]
pub async fn authorize_owned<R>(repo: &R, id: uuid::Uuid, user: &CurrentUser, action: Operation, resource: Resource) -> Result<R::Response>
where
    R: Repository<Id = uuid::Uuid> + ?Sized,
    R::Response: OwnedResource,
{
    let record = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: resource.singular().to_string(),
        id: id.to_string(),
    })?;

    check_ownership_or_role(user, record.owner_id(), action, resource)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Store, models::notes::NoteCreateDBRequest};
    use uuid::Uuid;

    fn caller(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "caller@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_ownership_or_admin_matrix() {
        let user = caller(Role::User);
        let admin = caller(Role::Admin);
        let someone_else = Uuid::new_v4();

        assert!(can_access(&user, user.id));
        assert!(!can_access(&user, someone_else));
        assert!(can_access(&admin, someone_else));
        assert!(can_access(&admin, admin.id));
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(&caller(Role::Admin), Role::Admin, Operation::ReadAll, Resource::Users).is_ok());

        let err = require_role(&caller(Role::User), Role::Admin, Operation::DeleteAll, Resource::Users).unwrap_err();
        assert_eq!(err.status_code().as_u16(), 403);
        assert_eq!(err.user_message(), "Insufficient permissions to delete users");
    }

    #[test]
    fn test_user_record_is_owned_by_itself() {
        let store_user = caller(Role::User);
        let record = UserDBResponse {
            id: store_user.id,
            name: "n".to_string(),
            email: store_user.email.clone(),
            password_hash: String::new(),
            role: Role::User,
            profile_picture: String::new(),
            social_media: Default::default(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        assert_eq!(record.owner_id(), store_user.id);
    }

    #[tokio::test]
    async fn test_authorize_owned_against_store() {
        let store = Store::in_memory();
        let owner = caller(Role::User);
        let note = store
            .notes
            .create(&NoteCreateDBRequest {
                user_id: owner.id,
                title: "mine".to_string(),
                category: String::new(),
                note: String::new(),
            })
            .await
            .unwrap();

        let found = authorize_owned(&*store.notes, note.id, &owner, Operation::ReadOwn, Resource::Notes)
            .await
            .unwrap();
        assert_eq!(found.id, note.id);

        let admin = caller(Role::Admin);
        assert!(
            authorize_owned(&*store.notes, note.id, &admin, Operation::DeleteOwn, Resource::Notes)
                .await
                .is_ok()
        );

        let intruder = caller(Role::User);
        let err = authorize_owned(&*store.notes, note.id, &intruder, Operation::UpdateOwn, Resource::Notes)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientPermissions { .. }));
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found_even_when_forbidden() {
        let store = Store::in_memory();
        let intruder = caller(Role::User);

        let err = authorize_owned(&*store.tasks, Uuid::new_v4(), &intruder, Operation::DeleteOwn, Resource::Tasks)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { ref resource, .. } if resource == "Task"));
        assert_eq!(err.status_code().as_u16(), 404);
    }
}
