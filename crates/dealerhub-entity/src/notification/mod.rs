//! Notification domain entities.

pub mod category;
pub mod event_type;
pub mod model;
pub mod preference;
pub mod priority;
pub mod status;

pub use category::NotificationCategory;
pub use event_type::EventType;
pub use model::{NewNotification, NotificationRecord};
pub use preference::{NotificationPreferences, PreferenceLevel, UserPreferences};
pub use priority::NotificationPriority;
pub use status::NotificationStatus;
