//! Notification priority.

use serde::{Deserialize, Serialize};

/// How urgently a notification should reach the recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl NotificationPriority {
    /// Return the priority as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Value of the Web Push `Urgency` header for this priority.
    pub fn push_urgency(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "normal",
            Self::High | Self::Urgent => "high",
        }
    }

    /// Whether the client should keep the notification on screen until acted on.
    pub fn requires_interaction(&self) -> bool {
        matches!(self, Self::High | Self::Urgent)
    }
}

impl std::fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
