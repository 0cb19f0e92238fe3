//! Device and push-subscription registry.

pub mod service;

pub use service::DeviceService;
