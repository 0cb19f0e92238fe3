//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Outbound buffer per connection; messages are dropped when full.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Maximum rooms a single connection may join.
    #[serde(default = "default_max_rooms")]
    pub max_rooms_per_connection: usize,
    /// Seconds a freshly opened socket has to send `authenticate`.
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            max_rooms_per_connection: default_max_rooms(),
            auth_timeout_seconds: default_auth_timeout(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_max_rooms() -> usize {
    50
}

fn default_auth_timeout() -> u64 {
    15
}
