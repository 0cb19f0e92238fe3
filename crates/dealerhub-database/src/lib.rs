//! # dealerhub-database
//!
//! PostgreSQL connection management, the narrow store traits the
//! notification pipeline reads and writes through, their `sqlx`
//! repository implementations, and in-memory stores for tests and
//! database-less local runs.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{
    DeviceStore, NotificationStore, PermissionStore, PreferenceStore, SubscriptionStore,
    UserDirectory,
};
