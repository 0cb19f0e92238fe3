//! Pending-notification access for the polling fallback.

use std::fmt;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::debug;

use dealerhub_core::config::notifications::NotificationsConfig;
use dealerhub_core::error::AppError;
use dealerhub_core::types::{NotificationId, UserId};
use dealerhub_database::store::NotificationStore;
use dealerhub_entity::notification::NotificationRecord;

/// Serves the caller's undelivered notifications and acknowledgements.
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    config: NotificationsConfig,
}

impl fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(store: Arc<dyn NotificationStore>, config: NotificationsConfig) -> Self {
        Self { store, config }
    }

    /// Pending notifications for the user, newest first.
    ///
    /// Records older than the configured pending window are not offered.
    pub async fn pending(&self, user_id: UserId) -> Result<Vec<NotificationRecord>, AppError> {
        let since = Utc::now() - Duration::hours(i64::from(self.config.pending_ttl_hours));
        self.store
            .find_pending(user_id, since, self.config.poll_limit)
            .await
    }

    /// Mark one of the user's notifications delivered.
    pub async fn confirm_delivered(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<(), AppError> {
        let updated = self.store.mark_delivered(id, user_id, Utc::now()).await?;
        if !updated {
            return Err(AppError::not_found(format!(
                "No pending notification {id} for this user"
            )));
        }
        debug!(notification_id = %id, user_id = %user_id, "Notification confirmed delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealerhub_core::error::ErrorKind;
    use dealerhub_database::memory::MemoryNotificationStore;
    use dealerhub_entity::notification::{
        EventType, NewNotification, NotificationCategory, NotificationPriority, NotificationStatus,
    };
    use serde_json::json;

    fn new_notification(user_id: UserId) -> NewNotification {
        NewNotification {
            user_id,
            event_type: EventType::LeadCreated,
            category: NotificationCategory::Leads,
            priority: NotificationPriority::Medium,
            title: "New lead".into(),
            message: "New lead from Ann".into(),
            action_url: Some("/leads/7".into()),
            entity_type: Some("lead".into()),
            entity_id: Some("7".into()),
            action_data: json!({"lead_id": 7}),
        }
    }

    #[tokio::test]
    async fn test_pending_excludes_stale_and_delivered() {
        let store = Arc::new(MemoryNotificationStore::new());
        let user = UserId::new();
        let fresh = store.insert(new_notification(user)).await.unwrap();
        let done = store.insert(new_notification(user)).await.unwrap();
        store.mark_delivered(done.id, user, Utc::now()).await.unwrap();
        let stale = new_notification(user)
            .into_record(NotificationId::new(), Utc::now() - Duration::hours(48));
        store.insert_record(stale);

        let service = NotificationService::new(store, NotificationsConfig::default());
        let pending = service.pending(user).await.unwrap();

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, fresh.id);
    }

    #[tokio::test]
    async fn test_confirm_requires_ownership() {
        let store = Arc::new(MemoryNotificationStore::new());
        let owner = UserId::new();
        let record = store.insert(new_notification(owner)).await.unwrap();
        let service = NotificationService::new(store.clone(), NotificationsConfig::default());

        let err = service
            .confirm_delivered(UserId::new(), record.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        service.confirm_delivered(owner, record.id).await.unwrap();
        let stored = store.all();
        assert_eq!(stored[0].status, NotificationStatus::Delivered);
        assert!(stored[0].delivered_at.is_some());

        let again = service.confirm_delivered(owner, record.id).await.unwrap_err();
        assert_eq!(again.kind, ErrorKind::NotFound);
    }
}
