//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Scheduled maintenance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the scheduler is started with the server.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (with seconds) for the subscription purge.
    #[serde(default = "default_purge_schedule")]
    pub subscription_purge_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            subscription_purge_cron: default_purge_schedule(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_purge_schedule() -> String {
    "0 30 3 * * *".to_string()
}
