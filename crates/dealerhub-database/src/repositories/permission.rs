//! Page permission repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use dealerhub_core::error::{AppError, ErrorKind};
use dealerhub_core::result::AppResult;
use dealerhub_core::types::UserId;
use dealerhub_entity::permission::{PagePermission, PermissionLevel};

use crate::store::PermissionStore;

/// Repository over `user_page_permissions`.
#[derive(Debug, Clone)]
pub struct PermissionRepository {
    pool: PgPool,
}

impl PermissionRepository {
    /// Create a new permission repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionStore for PermissionRepository {
    async fn find_level(&self, user_id: UserId, page: &str) -> AppResult<Option<PermissionLevel>> {
        let row = sqlx::query_as::<_, PagePermission>(
            "SELECT user_id, page, level, updated_at FROM user_page_permissions \
             WHERE user_id = $1 AND page = $2",
        )
        .bind(user_id)
        .bind(page)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read page permission", e))?;

        Ok(row.map(|p| p.level))
    }
}
