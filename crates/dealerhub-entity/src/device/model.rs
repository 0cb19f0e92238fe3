//! Device registration entity model.

use chrono::{DateTime, Utc};
use dealerhub_core::types::{DeviceId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::platform::DevicePlatform;

/// A device a user has signed in from.
///
/// A device can exist without any push subscription (iOS Safari outside a
/// home-screen install); such devices rely on the realtime connection and
/// the polling fallback.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeviceRegistration {
    /// Unique device identifier.
    pub id: DeviceId,
    /// Owning user.
    pub user_id: UserId,
    /// Client-generated token identifying the device. Unique.
    pub device_token: String,
    /// Device platform.
    pub platform: DevicePlatform,
    /// Whether the device can receive push messages.
    pub supports_push: bool,
    /// Whether the device can show an app badge.
    pub supports_badge: bool,
    /// Whether the device can play a notification sound.
    pub supports_sound: bool,
    /// Reported user agent.
    pub user_agent: Option<String>,
    /// Reported client application version.
    pub app_version: Option<String>,
    /// Last time the device registered or refreshed.
    pub last_active_at: DateTime<Utc>,
    /// When the device was first registered.
    pub created_at: DateTime<Utc>,
}

impl DeviceRegistration {
    /// Capability flags as a value object.
    pub fn capabilities(&self) -> DeviceCapabilities {
        DeviceCapabilities {
            push: self.supports_push,
            badge: self.supports_badge,
            sound: self.supports_sound,
        }
    }
}

/// Capability flags reported by a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub badge: bool,
    #[serde(default)]
    pub sound: bool,
}

/// Data required to register (or refresh) a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDeviceRegistration {
    /// Owning user.
    pub user_id: UserId,
    /// Client-generated device token.
    pub device_token: String,
    /// Device platform.
    pub platform: DevicePlatform,
    /// Capability flags.
    pub capabilities: DeviceCapabilities,
    /// Reported user agent.
    pub user_agent: Option<String>,
    /// Reported client version.
    pub app_version: Option<String>,
}
