//! Purge of deactivated push subscriptions.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use dealerhub_core::config::push::PushConfig;
use dealerhub_core::result::AppResult;
use dealerhub_database::store::SubscriptionStore;

/// Deletes subscriptions that have been inactive longer than the grace
/// period. Active subscriptions are never touched.
pub struct SubscriptionPurgeJob {
    subscriptions: Arc<dyn SubscriptionStore>,
    grace: Duration,
}

impl std::fmt::Debug for SubscriptionPurgeJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionPurgeJob")
            .field("grace_days", &self.grace.num_days())
            .finish()
    }
}

impl SubscriptionPurgeJob {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>, config: &PushConfig) -> Self {
        Self {
            subscriptions,
            grace: Duration::days(i64::from(config.inactive_grace_days)),
        }
    }

    /// Purge relative to `now`. Returns the number of rows removed.
    pub async fn run_at(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let cutoff = now - self.grace;
        let removed = self.subscriptions.purge_inactive(cutoff).await?;

        if removed > 0 {
            tracing::info!(removed, cutoff = %cutoff, "Purged inactive push subscriptions");
        } else {
            tracing::debug!(cutoff = %cutoff, "No inactive push subscriptions to purge");
        }
        Ok(removed)
    }

    pub async fn run(&self) -> AppResult<u64> {
        self.run_at(Utc::now()).await
    }
}
