//! In-memory repository implementations.
//!
//! Records live in concurrent maps and are lost on restart. Used when no database URL is
//! configured and throughout the test suite. Semantics mirror the Postgres repositories:
//! unique emails, not-found on update of a missing id, and deleting a user removes the
//! notes and tasks it owns.

use std::sync::Arc;

use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use tracing::instrument;
use uuid::Uuid;

use crate::api::models::users::{Role, SocialMedia};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{NoteRepository, OwnerFilter, Repository, TaskRepository, UserFilter, UserRepository},
    models::{
        notes::{NoteCreateDBRequest, NoteDBResponse, NoteUpdateDBRequest},
        tasks::{TaskCreateDBRequest, TaskDBResponse, TaskUpdateDBRequest},
        users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
    },
};
use crate::types::{NoteId, TaskId, UserId, abbrev_uuid};

#[derive(Clone, Default)]
pub struct InMemoryNotes {
    notes: Arc<DashMap<NoteId, NoteDBResponse>>,
}

impl InMemoryNotes {
    pub fn new() -> Self {
        Self::default()
    }

    fn remove_owned_by(&self, user_id: UserId) {
        self.notes.retain(|_, note| note.user_id != user_id);
    }
}

#[async_trait::async_trait]
impl Repository for InMemoryNotes {
    type CreateRequest = NoteCreateDBRequest;
    type UpdateRequest = NoteUpdateDBRequest;
    type Response = NoteDBResponse;
    type Id = NoteId;
    type Filter = OwnerFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let now = Utc::now();
        let note = NoteDBResponse {
            id: Uuid::new_v4(),
            title: request.title.clone(),
            category: request.category.clone(),
            note: request.note.clone(),
            user_id: request.user_id,
            created_at: now,
            updated_at: now,
        };
        self.notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.notes.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut notes: Vec<_> = self
            .notes
            .iter()
            .filter(|entry| filter.user_ids.contains(&entry.user_id))
            .map(|entry| entry.value().clone())
            .collect();
        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(notes)
    }

    #[instrument(skip(self, request), fields(note_id = %abbrev_uuid(&id)), err)]
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut note = self.notes.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(title) = &request.title {
            note.title = title.clone();
        }
        if let Some(category) = &request.category {
            note.category = category.clone();
        }
        if let Some(body) = &request.note {
            note.note = body.clone();
        }
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    #[instrument(skip(self), fields(note_id = %abbrev_uuid(&id)), err)]
    async fn delete(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.notes.remove(&id).map(|(_, note)| note))
    }
}

impl NoteRepository for InMemoryNotes {}

#[derive(Clone, Default)]
pub struct InMemoryTasks {
    tasks: Arc<DashMap<TaskId, TaskDBResponse>>,
}

impl InMemoryTasks {
    pub fn new() -> Self {
        Self::default()
    }

    fn remove_owned_by(&self, user_id: UserId) {
        self.tasks.retain(|_, task| task.user_id != user_id);
    }
}

#[async_trait::async_trait]
impl Repository for InMemoryTasks {
    type CreateRequest = TaskCreateDBRequest;
    type UpdateRequest = TaskUpdateDBRequest;
    type Response = TaskDBResponse;
    type Id = TaskId;
    type Filter = OwnerFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let now = Utc::now();
        let task = TaskDBResponse {
            id: Uuid::new_v4(),
            title: request.title.clone(),
            category: request.category.clone(),
            task: request.task.clone(),
            user_id: request.user_id,
            status_history: request.status_history.clone(),
            created_at: now,
            updated_at: now,
        };
        self.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tasks.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut tasks: Vec<_> = self
            .tasks
            .iter()
            .filter(|entry| filter.user_ids.contains(&entry.user_id))
            .map(|entry| entry.value().clone())
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    #[instrument(skip(self, request), fields(task_id = %abbrev_uuid(&id)), err)]
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut task = self.tasks.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(title) = &request.title {
            task.title = title.clone();
        }
        if let Some(category) = &request.category {
            task.category = category.clone();
        }
        if let Some(body) = &request.task {
            task.task = body.clone();
        }
        if let Some(entry) = &request.append_status {
            task.status_history.push(entry.clone());
        }
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    #[instrument(skip(self), fields(task_id = %abbrev_uuid(&id)), err)]
    async fn delete(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tasks.remove(&id).map(|(_, task)| task))
    }
}

impl TaskRepository for InMemoryTasks {}

/// Users plus an email index. Holds handles to the note and task maps so deleting a user
/// removes what it owns, like the foreign-key cascade in Postgres.
#[derive(Clone)]
pub struct InMemoryUsers {
    users: Arc<DashMap<UserId, UserDBResponse>>,
    emails: Arc<DashMap<String, UserId>>,
    notes: InMemoryNotes,
    tasks: InMemoryTasks,
}

impl InMemoryUsers {
    pub fn new(notes: InMemoryNotes, tasks: InMemoryTasks) -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            emails: Arc::new(DashMap::new()),
            notes,
            tasks,
        }
    }
}

#[async_trait::async_trait]
impl Repository for InMemoryUsers {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(role = %request.role), err)]
    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id = Uuid::new_v4();
        match self.emails.entry(request.email.clone()) {
            Entry::Occupied(_) => return Err(DbError::email_taken()),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let now = Utc::now();
        let user = UserDBResponse {
            id,
            name: request.name.clone(),
            email: request.email.clone(),
            password_hash: request.password_hash.clone(),
            role: request.role,
            profile_picture: String::new(),
            social_media: SocialMedia::default(),
            created_at: now,
            updated_at: now,
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut users: Vec<_> = self.users.iter().map(|entry| entry.value().clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users
            .into_iter()
            .skip(filter.skip.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut user = self.users.get_mut(&id).ok_or(DbError::NotFound)?;

        if let Some(email) = request.email.as_ref().filter(|email| **email != user.email) {
            match self.emails.entry(email.clone()) {
                Entry::Occupied(_) => return Err(DbError::email_taken()),
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
            self.emails.remove(&user.email);
            user.email = email.clone();
        }
        if let Some(name) = &request.name {
            user.name = name.clone();
        }
        if let Some(picture) = &request.profile_picture {
            user.profile_picture = picture.clone();
        }
        if let Some(social) = &request.social_media {
            user.social_media = social.clone();
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        let removed = self.users.remove(&id).map(|(_, user)| user);
        if let Some(user) = &removed {
            self.emails.remove(&user.email);
            self.notes.remove_owned_by(id);
            self.tasks.remove_owned_by(id);
        }
        Ok(removed)
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUsers {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserDBResponse>> {
        let Some(id) = self.emails.get(email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn set_credentials(&self, id: UserId, password_hash: &str, role: Role) -> Result<()> {
        let mut user = self.users.get_mut(&id).ok_or(DbError::NotFound)?;
        user.password_hash = password_hash.to_string();
        user.role = role;
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::tasks::StatusEntry;

    fn stores() -> (InMemoryUsers, InMemoryNotes, InMemoryTasks) {
        let notes = InMemoryNotes::new();
        let tasks = InMemoryTasks::new();
        (InMemoryUsers::new(notes.clone(), tasks.clone()), notes, tasks)
    }

    fn user_request(email: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_unique_violation() {
        let (users, _, _) = stores();
        users.create(&user_request("a@example.com")).await.unwrap();

        let err = users.create(&user_request("a@example.com")).await.unwrap_err();
        assert!(err.is_email_conflict());
    }

    #[tokio::test]
    async fn test_email_change_frees_old_address() {
        let (users, _, _) = stores();
        let user = users.create(&user_request("old@example.com")).await.unwrap();

        let update = UserUpdateDBRequest {
            email: Some("new@example.com".to_string()),
            ..Default::default()
        };
        users.update(user.id, &update).await.unwrap();

        assert!(users.get_user_by_email("old@example.com").await.unwrap().is_none());
        assert_eq!(users.get_user_by_email("new@example.com").await.unwrap().unwrap().id, user.id);
        users.create(&user_request("old@example.com")).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let (users, notes, tasks) = stores();
        let missing = Uuid::new_v4();
        assert!(matches!(
            users.update(missing, &UserUpdateDBRequest::default()).await,
            Err(DbError::NotFound)
        ));
        assert!(matches!(
            notes.update(missing, &NoteUpdateDBRequest::default()).await,
            Err(DbError::NotFound)
        ));
        assert!(matches!(
            tasks.update(missing, &TaskUpdateDBRequest::default()).await,
            Err(DbError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_none_fields_keep_values_and_empty_strings_clear() {
        let (_, notes, _) = stores();
        let note = notes
            .create(&NoteCreateDBRequest {
                user_id: Uuid::new_v4(),
                title: "title".to_string(),
                category: "work".to_string(),
                note: "body".to_string(),
            })
            .await
            .unwrap();

        let updated = notes
            .update(
                note.id,
                &NoteUpdateDBRequest {
                    title: None,
                    category: Some(String::new()),
                    note: Some("new body".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "title");
        assert_eq!(updated.category, "");
        assert_eq!(updated.note, "new body");
    }

    #[tokio::test]
    async fn test_status_history_is_appended() {
        let (_, _, tasks) = stores();
        let owner = Uuid::new_v4();
        let admin = Uuid::new_v4();
        let task = tasks
            .create(&TaskCreateDBRequest {
                user_id: owner,
                title: "t".to_string(),
                category: "c".to_string(),
                task: "do it".to_string(),
                status_history: vec![StatusEntry {
                    status: "todo".to_string(),
                    user_id: owner,
                }],
            })
            .await
            .unwrap();

        let updated = tasks
            .update(
                task.id,
                &TaskUpdateDBRequest {
                    append_status: Some(StatusEntry {
                        status: "done".to_string(),
                        user_id: admin,
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let statuses: Vec<_> = updated.status_history.iter().map(|s| (s.status.as_str(), s.user_id)).collect();
        assert_eq!(statuses, vec![("todo", owner), ("done", admin)]);

        let untouched = tasks.update(task.id, &TaskUpdateDBRequest::default()).await.unwrap();
        assert_eq!(untouched.status_history.len(), 2);
    }

    #[tokio::test]
    async fn test_deleting_user_removes_owned_records() {
        let (users, notes, tasks) = stores();
        let user = users.create(&user_request("owner@example.com")).await.unwrap();
        notes
            .create(&NoteCreateDBRequest {
                user_id: user.id,
                title: "n".to_string(),
                category: String::new(),
                note: String::new(),
            })
            .await
            .unwrap();
        tasks
            .create(&TaskCreateDBRequest {
                user_id: user.id,
                title: "t".to_string(),
                category: String::new(),
                task: String::new(),
                status_history: vec![],
            })
            .await
            .unwrap();

        let deleted = users.delete(user.id).await.unwrap();
        assert_eq!(deleted.map(|u| u.id), Some(user.id));
        assert!(notes.list(&OwnerFilter::new(user.id)).await.unwrap().is_empty());
        assert!(tasks.list(&OwnerFilter::new(user.id)).await.unwrap().is_empty());
        assert!(users.delete(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_owner_filter_matches_any_listed_owner() {
        let (_, notes, _) = stores();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        for owner in [a, b, c] {
            notes
                .create(&NoteCreateDBRequest {
                    user_id: owner,
                    title: String::new(),
                    category: String::new(),
                    note: String::new(),
                })
                .await
                .unwrap();
        }

        let listed = notes.list(&OwnerFilter::any_of(vec![a, c])).await.unwrap();
        let mut owners: Vec<_> = listed.iter().map(|n| n.user_id).collect();
        owners.sort();
        let mut expected = vec![a, c];
        expected.sort();
        assert_eq!(owners, expected);

        assert!(notes.list(&OwnerFilter::any_of(vec![])).await.unwrap().is_empty());
    }
}
