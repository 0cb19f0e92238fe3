//! Web Push delivery configuration.

use serde::{Deserialize, Serialize};

/// Web Push (VAPID) delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Whether push delivery is enabled at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// VAPID public key, base64url (uncompressed P-256 point).
    #[serde(default)]
    pub vapid_public_key: String,
    /// VAPID private key, base64url (raw 32-byte scalar).
    #[serde(default)]
    pub vapid_private_key: String,
    /// Contact URI placed in the VAPID `sub` claim (`mailto:` or `https:`).
    #[serde(default = "default_subject")]
    pub subject: String,
    /// Time-to-live the push service should hold an undelivered message.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u32,
    /// Upper bound on concurrently outstanding push requests.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_sends: usize,
    /// HTTP request timeout towards push services.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Icon shown by the service worker.
    #[serde(default = "default_icon")]
    pub icon: String,
    /// Badge shown by the service worker.
    #[serde(default = "default_badge")]
    pub badge: String,
    /// Days an inactive subscription is kept before being purged.
    #[serde(default = "default_grace_days")]
    pub inactive_grace_days: u32,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            vapid_public_key: String::new(),
            vapid_private_key: String::new(),
            subject: default_subject(),
            ttl_seconds: default_ttl(),
            max_concurrent_sends: default_max_concurrent(),
            request_timeout_seconds: default_request_timeout(),
            icon: default_icon(),
            badge: default_badge(),
            inactive_grace_days: default_grace_days(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_subject() -> String {
    "mailto:admin@dealerhub.local".to_string()
}

fn default_ttl() -> u32 {
    86_400
}

fn default_max_concurrent() -> usize {
    32
}

fn default_request_timeout() -> u64 {
    10
}

fn default_icon() -> String {
    "/icons/icon-192x192.png".to_string()
}

fn default_badge() -> String {
    "/icons/badge-72x72.png".to_string()
}

fn default_grace_days() -> u32 {
    30
}
