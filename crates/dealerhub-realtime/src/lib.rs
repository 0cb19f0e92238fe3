//! # dealerhub-realtime
//!
//! Realtime engine for DealerHub. Provides:
//!
//! - Connection management with in-band `authenticate` against the user directory
//! - Named rooms with personal, role, and restricted (admin/management) rooms
//! - The JSON wire protocol shared with `dealerhub-client`
//! - Broadcast of domain events and per-recipient `notification_created` events

pub mod broadcast;
pub mod connection;
pub mod engine;
pub mod message;
pub mod room;

pub use broadcast::RealtimeBroadcaster;
pub use connection::manager::ConnectionManager;
pub use engine::RealtimeEngine;
pub use room::registry::RoomRegistry;
