//! Client-side realtime session configuration.

use serde::{Deserialize, Serialize};

/// Settings for the connection session manager and the polling fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base HTTP URL of the server, e.g. `https://dealer.example.com`.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Path of the realtime WebSocket endpoint.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
    /// Rooms every authenticated session joins.
    #[serde(default = "default_baseline_rooms")]
    pub baseline_rooms: Vec<String>,
    /// Seconds between polls for pending notifications while visible.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            ws_path: default_ws_path(),
            baseline_rooms: default_baseline_rooms(),
            poll_interval_seconds: default_poll_interval(),
        }
    }
}

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

fn default_baseline_rooms() -> Vec<String> {
    vec![
        "dashboard".to_string(),
        "notifications".to_string(),
        "system".to_string(),
    ]
}

fn default_poll_interval() -> u64 {
    30
}
