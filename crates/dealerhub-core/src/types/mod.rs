//! Shared value types.

pub mod id;

pub use id::{DeviceId, NotificationId, SubscriptionId, UserId};
