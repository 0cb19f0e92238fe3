//! Device registration entities.

pub mod model;
pub mod platform;

pub use model::{DeviceCapabilities, DeviceRegistration, NewDeviceRegistration};
pub use platform::DevicePlatform;
