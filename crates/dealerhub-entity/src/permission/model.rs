//! Page permission entity model.

use chrono::{DateTime, Utc};
use dealerhub_core::types::UserId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::level::PermissionLevel;

/// An explicit permission entry for one user on one page.
///
/// Absence of a row means the role default applies.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PagePermission {
    /// The user the entry applies to.
    pub user_id: UserId,
    /// Page key, e.g. `"inventory"` or `"workshop"`.
    pub page: String,
    /// Granted level.
    pub level: PermissionLevel,
    /// When the entry was last changed.
    pub updated_at: DateTime<Utc>,
}
