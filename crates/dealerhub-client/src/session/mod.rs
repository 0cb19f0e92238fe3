//! Authenticated realtime session with reconnection.

pub mod connection;
pub mod manager;
pub mod status;

pub use connection::ConnectionSession;
pub use manager::SessionManager;
pub use status::{ConnectionStatus, SessionSnapshot};
