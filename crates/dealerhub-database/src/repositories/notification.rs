//! Notification record repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use dealerhub_core::error::{AppError, ErrorKind};
use dealerhub_core::result::AppResult;
use dealerhub_core::types::{NotificationId, UserId};
use dealerhub_entity::notification::{NewNotification, NotificationRecord};

use crate::store::NotificationStore;

/// Repository over the `notifications` table.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn insert(&self, n: NewNotification) -> AppResult<NotificationRecord> {
        sqlx::query_as::<_, NotificationRecord>(
            "INSERT INTO notifications \
             (id, user_id, event_type, category, priority, title, message, action_url, entity_type, entity_id, action_data) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
        )
        .bind(NotificationId::new())
        .bind(n.user_id)
        .bind(n.event_type)
        .bind(n.category)
        .bind(n.priority)
        .bind(&n.title)
        .bind(&n.message)
        .bind(&n.action_url)
        .bind(&n.entity_type)
        .bind(&n.entity_id)
        .bind(&n.action_data)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create notification", e))
    }

    async fn mark_delivered(
        &self,
        id: NotificationId,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET status = 'delivered', delivered_at = $3, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND status = 'pending'",
        )
        .bind(id)
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark delivered", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_pending(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<NotificationRecord>> {
        sqlx::query_as::<_, NotificationRecord>(
            "SELECT * FROM notifications \
             WHERE user_id = $1 AND status = 'pending' AND created_at > $2 \
             ORDER BY created_at DESC LIMIT $3",
        )
        .bind(user_id)
        .bind(since)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list pending notifications", e))
    }

    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<NotificationRecord>> {
        sqlx::query_as::<_, NotificationRecord>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list notifications", e))
    }
}
