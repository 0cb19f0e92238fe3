//! Store traits consumed by the notification pipeline.
//!
//! The pipeline only needs a handful of narrow reads and writes against
//! the relational store. Each concern is a trait so services can be wired
//! to PostgreSQL repositories in production and to the in-memory stores
//! in [`crate::memory`] under test.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use dealerhub_core::result::AppResult;
use dealerhub_core::types::{NotificationId, SubscriptionId, UserId};
use dealerhub_entity::device::{DeviceRegistration, NewDeviceRegistration};
use dealerhub_entity::notification::{NewNotification, NotificationPreferences, NotificationRecord};
use dealerhub_entity::permission::PermissionLevel;
use dealerhub_entity::push::{NewPushSubscription, PushSubscription};
use dealerhub_entity::user::User;

/// Read access to staff accounts.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Every account, active or not.
    async fn list_all(&self) -> AppResult<Vec<User>>;

    /// Look up one account.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;
}

/// Read access to explicit per-page permissions.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// The explicit level for `page`, or `None` when the role default applies.
    async fn find_level(&self, user_id: UserId, page: &str) -> AppResult<Option<PermissionLevel>>;
}

/// Read access to notification preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// The user's preference document, or `None` when none was ever saved.
    async fn find(&self, user_id: UserId) -> AppResult<Option<NotificationPreferences>>;
}

/// Persistence of notification records.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert a pending record.
    async fn insert(&self, notification: NewNotification) -> AppResult<NotificationRecord>;

    /// Set `delivered_at` on a still-pending record owned by `user_id`.
    ///
    /// Returns `false` when no such pending record exists.
    async fn mark_delivered(
        &self,
        id: NotificationId,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Pending records for a user created after `since`, newest first.
    async fn find_pending(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<NotificationRecord>>;

    /// Records for a user, newest first, regardless of status.
    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<NotificationRecord>>;
}

/// Persistence of Web Push subscriptions.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Insert or refresh a subscription keyed by endpoint.
    ///
    /// A refresh replaces owner and key material and reactivates it.
    async fn upsert(&self, subscription: NewPushSubscription) -> AppResult<PushSubscription>;

    /// Active subscriptions of a user.
    async fn find_active_by_user(&self, user_id: UserId) -> AppResult<Vec<PushSubscription>>;

    /// Mark a subscription inactive.
    async fn deactivate(&self, id: SubscriptionId) -> AppResult<()>;

    /// Mark the user's subscription for `endpoint` inactive.
    ///
    /// Returns `false` when the user owns no subscription for it.
    async fn deactivate_by_endpoint(&self, user_id: UserId, endpoint: &str) -> AppResult<bool>;

    /// Record an accepted delivery and reset the failure counter.
    async fn record_success(&self, id: SubscriptionId, at: DateTime<Utc>) -> AppResult<()>;

    /// Increment the failure counter.
    async fn record_failure(&self, id: SubscriptionId) -> AppResult<()>;

    /// Delete inactive subscriptions last touched before `before`.
    async fn purge_inactive(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

/// Persistence of device registrations.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Insert or refresh a device keyed by its token.
    async fn upsert(&self, device: NewDeviceRegistration) -> AppResult<DeviceRegistration>;

    /// Devices registered by a user.
    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<DeviceRegistration>>;
}
