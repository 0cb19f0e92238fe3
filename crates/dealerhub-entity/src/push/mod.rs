//! Web Push subscription entities.

pub mod subscription;

pub use subscription::{NewPushSubscription, PushSubscription, SubscriptionKeys};
