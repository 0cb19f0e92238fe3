//! In-memory device registrations.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use dealerhub_core::result::AppResult;
use dealerhub_core::types::{DeviceId, UserId};
use dealerhub_entity::device::{DeviceRegistration, NewDeviceRegistration};

use crate::store::DeviceStore;

/// Devices keyed by device token.
#[derive(Debug, Default)]
pub struct MemoryDeviceStore {
    by_token: DashMap<String, DeviceRegistration>,
}

impl MemoryDeviceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered devices.
    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    /// Whether no device is registered.
    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }
}

#[async_trait]
impl DeviceStore for MemoryDeviceStore {
    async fn upsert(&self, d: NewDeviceRegistration) -> AppResult<DeviceRegistration> {
        let now = Utc::now();
        let row = match self.by_token.entry(d.device_token.clone()) {
            Entry::Occupied(mut occupied) => {
                let existing = occupied.get_mut();
                existing.user_id = d.user_id;
                existing.platform = d.platform;
                existing.supports_push = d.capabilities.push;
                existing.supports_badge = d.capabilities.badge;
                existing.supports_sound = d.capabilities.sound;
                existing.user_agent = d.user_agent;
                existing.app_version = d.app_version;
                existing.last_active_at = now;
                existing.clone()
            }
            Entry::Vacant(vacant) => vacant
                .insert(DeviceRegistration {
                    id: DeviceId::new(),
                    user_id: d.user_id,
                    device_token: d.device_token,
                    platform: d.platform,
                    supports_push: d.capabilities.push,
                    supports_badge: d.capabilities.badge,
                    supports_sound: d.capabilities.sound,
                    user_agent: d.user_agent,
                    app_version: d.app_version,
                    last_active_at: now,
                    created_at: now,
                })
                .clone(),
        };
        Ok(row)
    }

    async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<DeviceRegistration>> {
        let mut devices: Vec<_> = self
            .by_token
            .iter()
            .filter(|d| d.user_id == user_id)
            .map(|d| d.value().clone())
            .collect();
        devices.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
        Ok(devices)
    }
}
