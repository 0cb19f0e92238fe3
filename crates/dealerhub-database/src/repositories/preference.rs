//! Notification preference repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use dealerhub_core::error::{AppError, ErrorKind};
use dealerhub_core::result::AppResult;
use dealerhub_core::types::UserId;
use dealerhub_entity::notification::{NotificationPreferences, UserPreferences};

use crate::store::PreferenceStore;

/// Repository over `notification_preferences`.
#[derive(Debug, Clone)]
pub struct PreferenceRepository {
    pool: PgPool,
}

impl PreferenceRepository {
    /// Create a new preference repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceStore for PreferenceRepository {
    async fn find(&self, user_id: UserId) -> AppResult<Option<NotificationPreferences>> {
        let row = sqlx::query_as::<_, UserPreferences>(
            "SELECT user_id, preferences, updated_at FROM notification_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to get preferences", e))?;

        Ok(row.map(|r| r.preferences.0))
    }
}
