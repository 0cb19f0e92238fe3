//! In-memory notification records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use dealerhub_core::result::AppResult;
use dealerhub_core::types::{NotificationId, UserId};
use dealerhub_entity::notification::{NewNotification, NotificationRecord, NotificationStatus};

use crate::store::NotificationStore;

/// Notification records keyed by id.
#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    records: DashMap<NotificationId, NotificationRecord>,
}

impl MemoryNotificationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record was stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every stored record, oldest first.
    pub fn all(&self) -> Vec<NotificationRecord> {
        let mut records: Vec<_> = self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|r| r.created_at);
        records
    }

    /// Insert a fully formed record, e.g. one backdated for a test.
    pub fn insert_record(&self, record: NotificationRecord) {
        self.records.insert(record.id, record);
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, notification: NewNotification) -> AppResult<NotificationRecord> {
        let record = notification.into_record(NotificationId::new(), Utc::now());
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn mark_delivered(
        &self,
        id: NotificationId,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        match self.records.get_mut(&id) {
            Some(mut record) if record.user_id == user_id && record.is_pending() => {
                record.status = NotificationStatus::Delivered;
                record.delivered_at = Some(at);
                record.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_pending(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
        limit: u32,
    ) -> AppResult<Vec<NotificationRecord>> {
        let mut pending: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.user_id == user_id && r.is_pending() && r.created_at > since)
            .map(|r| r.value().clone())
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        pending.truncate(limit as usize);
        Ok(pending)
    }

    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<NotificationRecord>> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
