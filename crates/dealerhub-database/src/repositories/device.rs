//! Device registration repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use dealerhub_core::error::{AppError, ErrorKind};
use dealerhub_core::result::AppResult;
use dealerhub_core::types::{DeviceId, UserId};
use dealerhub_entity::device::{DeviceRegistration, NewDeviceRegistration};

use crate::store::DeviceStore;

/// Repository over `device_registrations`.
#[derive(Debug, Clone)]
pub struct DeviceRepository {
    pool: PgPool,
}

impl DeviceRepository {
    /// Create a new device repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceStore for DeviceRepository {
    async fn upsert(&self, d: NewDeviceRegistration) -> AppResult<DeviceRegistration> {
        sqlx::query_as::<_, DeviceRegistration>(
            "INSERT INTO device_registrations \
             (id, user_id, device_token, platform, supports_push, supports_badge, supports_sound, user_agent, app_version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (device_token) DO UPDATE SET \
               user_id = EXCLUDED.user_id, \
               platform = EXCLUDED.platform, \
               supports_push = EXCLUDED.supports_push, \
               supports_badge = EXCLUDED.supports_badge, \
               supports_sound = EXCLUDED.supports_sound, \
               user_agent = EXCLUDED.user_agent, \
               app_version = EXCLUDED.app_version, \
               last_active_at = NOW() \
             RETURNING *",
        )
        .bind(DeviceId::new())
        .bind(d.user_id)
        .bind(&d.device_token)
        .bind(d.platform)
        .bind(d.capabilities.push)
        .bind(d.capabilities.badge)
        .bind(d.capabilities.sound)
        .bind(&d.user_agent)
        .bind(&d.app_version)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert device", e))
    }

    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<DeviceRegistration>> {
        sqlx::query_as::<_, DeviceRegistration>(
            "SELECT * FROM device_registrations WHERE user_id = $1 ORDER BY last_active_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list devices", e))
    }
}
