//! Maintenance job implementations.

pub mod subscription_purge;

pub use subscription_purge::SubscriptionPurgeJob;
