//! Notification record writer.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use dealerhub_core::result::AppResult;
use dealerhub_core::types::UserId;
use dealerhub_database::store::NotificationStore;
use dealerhub_entity::notification::{NewNotification, NotificationRecord};

use super::registry::{EventDefinition, RenderedNotification};

/// Persists one record per (event occurrence, recipient).
pub struct NotificationWriter {
    store: Arc<dyn NotificationStore>,
}

impl fmt::Debug for NotificationWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationWriter").finish_non_exhaustive()
    }
}

impl NotificationWriter {
    /// Creates a new writer.
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// Write a pending record for `user_id`.
    pub async fn write(
        &self,
        definition: &EventDefinition,
        rendered: &RenderedNotification,
        payload: &Value,
        user_id: UserId,
    ) -> AppResult<NotificationRecord> {
        let record = self
            .store
            .insert(NewNotification {
                user_id,
                event_type: definition.event_type,
                category: definition.category,
                priority: definition.priority,
                title: rendered.title.clone(),
                message: rendered.message.clone(),
                action_url: Some(rendered.action_url.clone()),
                entity_type: Some(definition.entity_type.clone()),
                entity_id: rendered.entity_id.clone(),
                action_data: payload.clone(),
            })
            .await?;

        debug!(
            notification_id = %record.id,
            user_id = %user_id,
            event_type = %definition.event_type,
            "Notification record written"
        );
        Ok(record)
    }

    /// Record that a channel confirmed delivery.
    pub async fn mark_delivered(&self, record: &NotificationRecord) -> AppResult<bool> {
        self.store
            .mark_delivered(record.id, record.user_id, Utc::now())
            .await
    }
}
