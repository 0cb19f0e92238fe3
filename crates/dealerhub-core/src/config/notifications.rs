//! Notification record and polling-buffer configuration.

use serde::{Deserialize, Serialize};

/// Settings for the pending-notification buffer served to polling clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Pending notifications older than this are no longer offered to pollers.
    #[serde(default = "default_pending_ttl")]
    pub pending_ttl_hours: u32,
    /// Maximum notifications returned per poll.
    #[serde(default = "default_poll_limit")]
    pub poll_limit: u32,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            pending_ttl_hours: default_pending_ttl(),
            poll_limit: default_poll_limit(),
        }
    }
}

fn default_pending_ttl() -> u32 {
    24
}

fn default_poll_limit() -> u32 {
    20
}
