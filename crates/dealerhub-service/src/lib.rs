//! # dealerhub-service
//!
//! The server side of the notification pipeline: event registry and
//! template rendering, recipient resolution, notification record writing,
//! Web Push delivery, the device/subscription registry, and the
//! [`EventTrigger`] entry point that ties them together.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod device;
pub mod notification;
pub mod push;

pub use device::DeviceService;
pub use notification::{
    EventRegistry, EventTrigger, NotificationService, NotificationWriter, RealtimeChannel,
    RecipientResolver, TriggerReport,
};
pub use push::PushService;
