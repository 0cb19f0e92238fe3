//! In-memory users, page permissions, and preferences.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use dealerhub_core::result::AppResult;
use dealerhub_core::types::UserId;
use dealerhub_entity::notification::NotificationPreferences;
use dealerhub_entity::permission::PermissionLevel;
use dealerhub_entity::user::{User, UserRole};

use crate::store::{PermissionStore, PreferenceStore, UserDirectory};

/// Users with their page permissions and preference documents.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: DashMap<UserId, User>,
    permissions: DashMap<(UserId, String), PermissionLevel>,
    preferences: DashMap<UserId, NotificationPreferences>,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an active user and return its id.
    pub fn add_user(&self, username: &str, role: UserRole) -> UserId {
        let id = UserId::new();
        self.insert_user(User {
            id,
            username: username.to_string(),
            display_name: None,
            role,
            is_active: true,
            created_at: Utc::now(),
        });
        id
    }

    /// Insert or replace a user row.
    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    /// Activate or deactivate an account.
    pub fn set_active(&self, id: UserId, active: bool) {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.is_active = active;
        }
    }

    /// Set an explicit page permission.
    pub fn set_permission(&self, id: UserId, page: &str, level: PermissionLevel) {
        self.permissions.insert((id, page.to_string()), level);
    }

    /// Store a preference document.
    pub fn set_preferences(&self, id: UserId, preferences: NotificationPreferences) {
        self.preferences.insert(id, preferences);
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn list_all(&self) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.username.cmp(&b.username)));
        Ok(users)
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }
}

#[async_trait]
impl PermissionStore for MemoryDirectory {
    async fn find_level(&self, user_id: UserId, page: &str) -> AppResult<Option<PermissionLevel>> {
        Ok(self
            .permissions
            .get(&(user_id, page.to_string()))
            .map(|l| *l.value()))
    }
}

#[async_trait]
impl PreferenceStore for MemoryDirectory {
    async fn find(&self, user_id: UserId) -> AppResult<Option<NotificationPreferences>> {
        Ok(self.preferences.get(&user_id).map(|p| p.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deactivated_user_still_listed() {
        let dir = MemoryDirectory::new();
        let id = dir.add_user("carol", UserRole::Technician);
        dir.set_active(id, false);

        let users = dir.list_all().await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(!users[0].is_active);
    }

    #[tokio::test]
    async fn test_permission_lookup_is_per_page() {
        let dir = MemoryDirectory::new();
        let id = dir.add_user("dan", UserRole::Salesperson);
        dir.set_permission(id, "sales", PermissionLevel::Hidden);

        assert_eq!(dir.find_level(id, "sales").await.unwrap(), Some(PermissionLevel::Hidden));
        assert_eq!(dir.find_level(id, "inventory").await.unwrap(), None);
    }
}
