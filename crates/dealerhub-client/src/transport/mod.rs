//! Transport seam between the session and the network.

pub mod memory;
pub mod websocket;

use async_trait::async_trait;

use dealerhub_realtime::message::{InboundMessage, OutboundMessage};

use crate::error::ConnectionError;
use crate::profile::TransportProfile;

pub use memory::{MemoryConnector, MemoryPeer};
pub use websocket::WebSocketConnector;

/// An open, bidirectional message transport.
///
/// `recv` must be cancel safe: the session polls it inside `select!`.
#[async_trait]
pub trait Transport: Send {
    /// Send one client message.
    async fn send(&mut self, message: &InboundMessage) -> Result<(), ConnectionError>;

    /// Next server message; `None` once the transport has closed.
    async fn recv(&mut self) -> Option<Result<OutboundMessage, ConnectionError>>;

    /// Close the transport.
    async fn close(&mut self);
}

/// Opens transports according to a profile.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        profile: &TransportProfile,
    ) -> Result<Box<dyn Transport>, ConnectionError>;
}
