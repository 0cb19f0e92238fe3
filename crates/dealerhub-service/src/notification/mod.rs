//! Event registry, recipient resolution, record writing, and the trigger.

pub mod channel;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod template;
pub mod trigger;
pub mod writer;

pub use channel::RealtimeChannel;
pub use registry::{EventDefinition, EventRegistry, RecipientCriteria, RenderedNotification};
pub use resolver::{Exclusion, RecipientResolver, Resolution};
pub use service::NotificationService;
pub use trigger::{EventTrigger, RecipientReport, TriggerOutcome, TriggerReport};
pub use writer::NotificationWriter;
