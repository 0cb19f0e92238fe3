//! The JSON document a service worker receives.

use serde::{Deserialize, Serialize};

use dealerhub_core::types::NotificationId;
use dealerhub_entity::notification::{EventType, NotificationRecord};

/// Fixed-shape push payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Replaces an earlier notification with the same tag on the device.
    pub tag: String,
    pub data: PushData,
}

/// Data the service worker needs to route a click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushData {
    pub url: String,
    pub notification_id: NotificationId,
    pub event_type: EventType,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl PushPayload {
    /// Build the payload for a stored notification.
    pub fn from_record(record: &NotificationRecord, icon: &str, badge: &str) -> Self {
        let tag = match &record.entity_id {
            Some(entity_id) => format!("{}-{}", record.event_type, entity_id),
            None => format!("{}-{}", record.event_type, record.id),
        };

        Self {
            title: record.title.clone(),
            body: record.message.clone(),
            icon: icon.to_string(),
            badge: badge.to_string(),
            tag,
            data: PushData {
                url: record.action_url.clone().unwrap_or_else(|| "/".to_string()),
                notification_id: record.id,
                event_type: record.event_type,
                entity_type: record.entity_type.clone(),
                entity_id: record.entity_id.clone(),
                timestamp: record.created_at.timestamp_millis(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dealerhub_core::types::UserId;
    use dealerhub_entity::notification::{
        NewNotification, NotificationCategory, NotificationPriority,
    };
    use serde_json::json;

    #[test]
    fn test_payload_shape() {
        let record = NewNotification {
            user_id: UserId::new(),
            event_type: EventType::VehicleSold,
            category: NotificationCategory::Sales,
            priority: NotificationPriority::High,
            title: "Vehicle sold".into(),
            message: "bob sold 'XY99ABC' for 15000".into(),
            action_url: Some("/sales/42".into()),
            entity_type: Some("vehicle".into()),
            entity_id: Some("42".into()),
            action_data: json!({}),
        }
        .into_record(NotificationId::new(), Utc::now());

        let payload = PushPayload::from_record(&record, "/icon.png", "/badge.png");
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["title"], "Vehicle sold");
        assert_eq!(value["tag"], "vehicle.sold-42");
        assert_eq!(value["data"]["url"], "/sales/42");
        assert_eq!(value["data"]["event_type"], "vehicle.sold");
        assert_eq!(value["data"]["entity_id"], "42");
        assert_eq!(value["data"]["notification_id"], record.id.to_string());
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 6);
    }
}
