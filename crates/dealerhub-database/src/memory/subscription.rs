//! In-memory push subscriptions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use dealerhub_core::result::AppResult;
use dealerhub_core::types::{SubscriptionId, UserId};
use dealerhub_entity::push::{NewPushSubscription, PushSubscription};

use crate::store::SubscriptionStore;

/// Push subscriptions keyed by endpoint, which is unique.
#[derive(Debug, Default)]
pub struct MemorySubscriptionStore {
    by_endpoint: DashMap<String, PushSubscription>,
}

impl MemorySubscriptionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look a subscription up by endpoint.
    pub fn get(&self, endpoint: &str) -> Option<PushSubscription> {
        self.by_endpoint.get(endpoint).map(|s| s.value().clone())
    }

    /// Number of stored subscriptions, active or not.
    pub fn len(&self) -> usize {
        self.by_endpoint.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.by_endpoint.is_empty()
    }

    /// Insert a fully formed row, e.g. one backdated for a test.
    pub fn insert_row(&self, subscription: PushSubscription) {
        self.by_endpoint.insert(subscription.endpoint.clone(), subscription);
    }

    fn update_by_id(&self, id: SubscriptionId, f: impl FnOnce(&mut PushSubscription)) {
        if let Some(mut entry) = self.by_endpoint.iter_mut().find(|s| s.id == id) {
            f(entry.value_mut());
        }
    }
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn upsert(&self, s: NewPushSubscription) -> AppResult<PushSubscription> {
        let now = Utc::now();
        let row = match self.by_endpoint.entry(s.endpoint.clone()) {
            Entry::Occupied(mut occupied) => {
                let existing = occupied.get_mut();
                existing.user_id = s.user_id;
                existing.device_id = s.device_id;
                existing.p256dh = s.keys.p256dh;
                existing.auth = s.keys.auth;
                existing.is_active = true;
                existing.failure_count = 0;
                existing.updated_at = now;
                existing.clone()
            }
            Entry::Vacant(vacant) => vacant
                .insert(PushSubscription {
                    id: SubscriptionId::new(),
                    user_id: s.user_id,
                    device_id: s.device_id,
                    endpoint: s.endpoint,
                    p256dh: s.keys.p256dh,
                    auth: s.keys.auth,
                    is_active: true,
                    last_success_at: None,
                    failure_count: 0,
                    created_at: now,
                    updated_at: now,
                })
                .clone(),
        };
        Ok(row)
    }

    async fn find_active_by_user(&self, user_id: UserId) -> AppResult<Vec<PushSubscription>> {
        let mut subs: Vec<_> = self
            .by_endpoint
            .iter()
            .filter(|s| s.user_id == user_id && s.is_active)
            .map(|s| s.value().clone())
            .collect();
        subs.sort_by_key(|s| s.created_at);
        Ok(subs)
    }

    async fn deactivate(&self, id: SubscriptionId) -> AppResult<()> {
        self.update_by_id(id, |s| {
            s.is_active = false;
            s.updated_at = Utc::now();
        });
        Ok(())
    }

    async fn deactivate_by_endpoint(&self, user_id: UserId, endpoint: &str) -> AppResult<bool> {
        match self.by_endpoint.get_mut(endpoint) {
            Some(mut s) if s.user_id == user_id => {
                s.is_active = false;
                s.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_success(&self, id: SubscriptionId, at: DateTime<Utc>) -> AppResult<()> {
        self.update_by_id(id, |s| {
            s.last_success_at = Some(at);
            s.failure_count = 0;
            s.updated_at = at;
        });
        Ok(())
    }

    async fn record_failure(&self, id: SubscriptionId) -> AppResult<()> {
        self.update_by_id(id, |s| {
            s.failure_count += 1;
            s.updated_at = Utc::now();
        });
        Ok(())
    }

    async fn purge_inactive(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let before_len = self.by_endpoint.len();
        self.by_endpoint
            .retain(|_, s| s.is_active || s.updated_at >= before);
        Ok((before_len - self.by_endpoint.len()) as u64)
    }
}
