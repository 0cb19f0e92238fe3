//! Push subscription repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use dealerhub_core::error::{AppError, ErrorKind};
use dealerhub_core::result::AppResult;
use dealerhub_core::types::{SubscriptionId, UserId};
use dealerhub_entity::push::{NewPushSubscription, PushSubscription};

use crate::store::SubscriptionStore;

/// Repository over `push_subscriptions`.
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for SubscriptionRepository {
    async fn upsert(&self, s: NewPushSubscription) -> AppResult<PushSubscription> {
        sqlx::query_as::<_, PushSubscription>(
            "INSERT INTO push_subscriptions (id, user_id, device_id, endpoint, p256dh, auth) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (endpoint) DO UPDATE SET \
               user_id = EXCLUDED.user_id, \
               device_id = EXCLUDED.device_id, \
               p256dh = EXCLUDED.p256dh, \
               auth = EXCLUDED.auth, \
               is_active = TRUE, \
               failure_count = 0, \
               updated_at = NOW() \
             RETURNING *",
        )
        .bind(SubscriptionId::new())
        .bind(s.user_id)
        .bind(s.device_id)
        .bind(&s.endpoint)
        .bind(&s.keys.p256dh)
        .bind(&s.keys.auth)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert push subscription", e))
    }

    async fn find_active_by_user(&self, user_id: UserId) -> AppResult<Vec<PushSubscription>> {
        sqlx::query_as::<_, PushSubscription>(
            "SELECT * FROM push_subscriptions WHERE user_id = $1 AND is_active ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list push subscriptions", e))
    }

    async fn deactivate(&self, id: SubscriptionId) -> AppResult<()> {
        sqlx::query("UPDATE push_subscriptions SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to deactivate subscription", e))?;
        Ok(())
    }

    async fn deactivate_by_endpoint(&self, user_id: UserId, endpoint: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE push_subscriptions SET is_active = FALSE, updated_at = NOW() \
             WHERE user_id = $1 AND endpoint = $2",
        )
        .bind(user_id)
        .bind(endpoint)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to deactivate subscription", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_success(&self, id: SubscriptionId, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE push_subscriptions SET last_success_at = $2, failure_count = 0, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record push success", e))?;
        Ok(())
    }

    async fn record_failure(&self, id: SubscriptionId) -> AppResult<()> {
        sqlx::query(
            "UPDATE push_subscriptions SET failure_count = failure_count + 1, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record push failure", e))?;
        Ok(())
    }

    async fn purge_inactive(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM push_subscriptions WHERE is_active = FALSE AND updated_at < $1",
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to purge subscriptions", e))?;
        Ok(result.rows_affected())
    }
}
