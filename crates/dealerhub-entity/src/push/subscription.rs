//! Push subscription entity model.

use chrono::{DateTime, Utc};
use dealerhub_core::types::{DeviceId, SubscriptionId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A browser-issued push endpoint plus the key material to encrypt for it.
///
/// Subscriptions are deactivated (not deleted) when the push service
/// reports them gone; the worker purges them after a grace period.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PushSubscription {
    /// Unique subscription identifier.
    pub id: SubscriptionId,
    /// Owning user.
    pub user_id: UserId,
    /// Device the subscription was registered from, if known.
    pub device_id: Option<DeviceId>,
    /// Push service endpoint URL. Unique across the table.
    pub endpoint: String,
    /// User agent public key (base64url, uncompressed P-256 point).
    pub p256dh: String,
    /// User agent authentication secret (base64url, 16 bytes).
    pub auth: String,
    /// Whether deliveries are still attempted.
    pub is_active: bool,
    /// Last accepted delivery.
    pub last_success_at: Option<DateTime<Utc>>,
    /// Consecutive failed deliveries.
    pub failure_count: i32,
    /// When the subscription was first registered.
    pub created_at: DateTime<Utc>,
    /// When the subscription was last changed.
    pub updated_at: DateTime<Utc>,
}

impl PushSubscription {
    /// Key material in the shape browsers hand out.
    pub fn keys(&self) -> SubscriptionKeys {
        SubscriptionKeys {
            p256dh: self.p256dh.clone(),
            auth: self.auth.clone(),
        }
    }
}

/// The `keys` object of a browser `PushSubscription`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    /// User agent public key.
    pub p256dh: String,
    /// Authentication secret.
    pub auth: String,
}

/// Data required to register (or refresh) a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPushSubscription {
    /// Owning user.
    pub user_id: UserId,
    /// Registering device, if known.
    pub device_id: Option<DeviceId>,
    /// Push service endpoint URL.
    pub endpoint: String,
    /// Key material.
    pub keys: SubscriptionKeys,
}
