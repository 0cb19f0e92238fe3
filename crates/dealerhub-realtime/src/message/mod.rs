//! Wire protocol: message types, builders, and validation.

pub mod builder;
pub mod event;
pub mod types;
pub mod validator;

pub use event::RealtimeEvent;
pub use types::{ConnectedUser, ErrorCode, InboundMessage, OutboundMessage};
