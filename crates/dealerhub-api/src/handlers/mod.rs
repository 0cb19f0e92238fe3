//! HTTP and WebSocket handlers.

pub mod device;
pub mod health;
pub mod notification;
pub mod push;
pub mod ws;
