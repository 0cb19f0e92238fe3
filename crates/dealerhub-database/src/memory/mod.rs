//! In-memory store implementations.
//!
//! Backed by [`DashMap`](dashmap::DashMap) and safe to share across tasks.
//! Used by the test suites and by the server when started without a
//! database.

pub mod device;
pub mod directory;
pub mod notification;
pub mod subscription;

pub use device::MemoryDeviceStore;
pub use directory::MemoryDirectory;
pub use notification::MemoryNotificationStore;
pub use subscription::MemorySubscriptionStore;
