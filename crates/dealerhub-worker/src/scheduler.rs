//! Cron scheduler for periodic maintenance tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use dealerhub_core::config::worker::WorkerConfig;
use dealerhub_core::error::AppError;

use crate::jobs::SubscriptionPurgeJob;

/// Cron-based scheduler for maintenance tasks
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Schedule settings
    config: WorkerConfig,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("enabled", &self.config.enabled)
            .finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(config: WorkerConfig) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self { scheduler, config })
    }

    /// Register the inactive subscription purge on the configured schedule
    pub async fn register_subscription_purge(
        &self,
        job: Arc<SubscriptionPurgeJob>,
    ) -> Result<(), AppError> {
        let schedule = self.config.subscription_purge_cron.as_str();
        let cron = CronJob::new_async(schedule, move |_uuid, _lock| {
            let job = Arc::clone(&job);
            Box::pin(async move {
                tracing::debug!("Running subscription purge");
                if let Err(e) = job.run().await {
                    tracing::error!(error = %e, "Subscription purge failed");
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid subscription purge schedule '{schedule}': {e}"
            ))
        })?;

        self.scheduler.add(cron).await.map_err(|e| {
            AppError::internal(format!("Failed to add subscription purge schedule: {e}"))
        })?;

        tracing::info!(schedule, "Registered: subscription_purge");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use dealerhub_core::config::push::PushConfig;
    use dealerhub_core::error::ErrorKind;
    use dealerhub_database::memory::MemorySubscriptionStore;

    fn purge_job() -> Arc<SubscriptionPurgeJob> {
        Arc::new(SubscriptionPurgeJob::new(
            Arc::new(MemorySubscriptionStore::new()),
            &PushConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_registers_default_schedule() {
        let scheduler = CronScheduler::new(WorkerConfig::default()).await.unwrap();
        scheduler.register_subscription_purge(purge_job()).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_invalid_schedule() {
        let config = WorkerConfig {
            subscription_purge_cron: "every tuesday".into(),
            ..WorkerConfig::default()
        };
        let scheduler = CronScheduler::new(config).await.unwrap();
        let err = scheduler
            .register_subscription_purge(purge_job())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
