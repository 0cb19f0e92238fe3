//! Notification preference entity and precedence rules.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dealerhub_core::types::UserId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use super::category::NotificationCategory;
use super::event_type::EventType;

/// Stored preference row for one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserPreferences {
    /// The user these preferences belong to.
    pub user_id: UserId,
    /// Typed preference document (JSONB column).
    pub preferences: Json<NotificationPreferences>,
    /// When preferences were last updated.
    pub updated_at: DateTime<Utc>,
}

/// A user's notification switches.
///
/// Every switch is optional. An absent switch never excludes anything;
/// only an explicit `false` does.
///
/// ```json
/// {
///   "notifications_enabled": true,
///   "push_enabled": true,
///   "categories": { "sales": false },
///   "events": { "vehicle.sold": true }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    /// Global switch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications_enabled: Option<bool>,
    /// Push-channel switch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_enabled: Option<bool>,
    /// Per-category switches.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub categories: BTreeMap<NotificationCategory, bool>,
    /// Per-event switches, keyed by the event type itself.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub events: BTreeMap<EventType, bool>,
}

/// The switch that excluded a user, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceLevel {
    Global,
    PushChannel,
    Category,
    Event,
}

impl NotificationPreferences {
    /// Apply the precedence chain global → push channel → category → event.
    ///
    /// Returns the first level that is explicitly switched off, or `None`
    /// when the user should be notified.
    pub fn excluded_by(
        &self,
        event_type: EventType,
        category: NotificationCategory,
    ) -> Option<PreferenceLevel> {
        if self.notifications_enabled == Some(false) {
            return Some(PreferenceLevel::Global);
        }
        if self.push_enabled == Some(false) {
            return Some(PreferenceLevel::PushChannel);
        }
        if self.categories.get(&category) == Some(&false) {
            return Some(PreferenceLevel::Category);
        }
        if self.events.get(&event_type) == Some(&false) {
            return Some(PreferenceLevel::Event);
        }
        None
    }

    /// Convenience inverse of [`excluded_by`](Self::excluded_by).
    pub fn allows(&self, event_type: EventType, category: NotificationCategory) -> bool {
        self.excluded_by(event_type, category).is_none()
    }
}
