//! Scheduled maintenance for DealerHub.
//!
//! - A cron scheduler started alongside the server
//! - The purge of push subscriptions that stayed inactive past the grace period

pub mod jobs;
pub mod scheduler;

pub use jobs::SubscriptionPurgeJob;
pub use scheduler::CronScheduler;
