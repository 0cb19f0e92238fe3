//! Notification record entity model.

use chrono::{DateTime, Utc};
use dealerhub_core::types::{NotificationId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::category::NotificationCategory;
use super::event_type::EventType;
use super::priority::NotificationPriority;
use super::status::NotificationStatus;

/// One notification for one recipient about one event occurrence.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationRecord {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// The recipient user.
    pub user_id: UserId,
    /// Event type that produced this notification.
    pub event_type: EventType,
    /// Notification category.
    pub category: NotificationCategory,
    /// Priority level.
    pub priority: NotificationPriority,
    /// Rendered title.
    pub title: String,
    /// Rendered body text.
    pub message: String,
    /// Rendered in-app link.
    pub action_url: Option<String>,
    /// Related entity type (e.g. `"vehicle"`).
    pub entity_type: Option<String>,
    /// Related entity identifier, as the caller supplied it.
    pub entity_id: Option<String>,
    /// The trigger payload, kept for the client.
    pub action_data: serde_json::Value,
    /// Lifecycle status.
    pub status: NotificationStatus,
    /// When a channel confirmed delivery.
    pub delivered_at: Option<DateTime<Utc>>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl NotificationRecord {
    /// Whether no channel has confirmed delivery yet.
    pub fn is_pending(&self) -> bool {
        self.status == NotificationStatus::Pending
    }
}

/// Data required to persist a new notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    /// The recipient user.
    pub user_id: UserId,
    /// Originating event type.
    pub event_type: EventType,
    /// Notification category.
    pub category: NotificationCategory,
    /// Priority level.
    pub priority: NotificationPriority,
    /// Rendered title.
    pub title: String,
    /// Rendered body.
    pub message: String,
    /// Rendered in-app link.
    pub action_url: Option<String>,
    /// Related entity type.
    pub entity_type: Option<String>,
    /// Related entity identifier.
    pub entity_id: Option<String>,
    /// Trigger payload.
    pub action_data: serde_json::Value,
}

impl NewNotification {
    /// Build the pending record this input will be stored as.
    pub fn into_record(self, id: NotificationId, now: DateTime<Utc>) -> NotificationRecord {
        NotificationRecord {
            id,
            user_id: self.user_id,
            event_type: self.event_type,
            category: self.category,
            priority: self.priority,
            title: self.title,
            message: self.message,
            action_url: self.action_url,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            action_data: self.action_data,
            status: NotificationStatus::Pending,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
