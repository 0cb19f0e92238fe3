//! PostgreSQL repository implementations of the store traits.

pub mod device;
pub mod notification;
pub mod permission;
pub mod preference;
pub mod subscription;
pub mod user;

pub use device::DeviceRepository;
pub use notification::NotificationRepository;
pub use permission::PermissionRepository;
pub use preference::PreferenceRepository;
pub use subscription::SubscriptionRepository;
pub use user::UserRepository;
