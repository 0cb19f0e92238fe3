//! In-process transport.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use dealerhub_realtime::message::{InboundMessage, OutboundMessage};

use super::{Connector, Transport};
use crate::error::ConnectionError;
use crate::profile::TransportProfile;

/// The far end of an in-process transport.
#[derive(Debug)]
pub struct MemoryPeer {
    /// Messages the client sent.
    pub inbound: mpsc::UnboundedReceiver<InboundMessage>,
    /// Messages to deliver to the client. Dropping it closes the transport.
    pub outbound: mpsc::UnboundedSender<OutboundMessage>,
}

/// A connector whose connections are accepted by whoever holds the peer
/// receiver.
///
/// Each `connect` hands a fresh [`MemoryPeer`] to the acceptor. Connects
/// fail while the acceptor is gone, or while refusals are queued with
/// [`refuse_next`](Self::refuse_next).
#[derive(Debug)]
pub struct MemoryConnector {
    accept_tx: mpsc::UnboundedSender<MemoryPeer>,
    refusals: Mutex<u32>,
}

impl MemoryConnector {
    /// Create a connector and the receiver of accepted peers.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MemoryPeer>) {
        let (accept_tx, accept_rx) = mpsc::unbounded_channel();
        (
            Self {
                accept_tx,
                refusals: Mutex::new(0),
            },
            accept_rx,
        )
    }

    /// Make the next `count` connects fail.
    pub fn refuse_next(&self, count: u32) {
        if let Ok(mut refusals) = self.refusals.lock() {
            *refusals += count;
        }
    }

    fn take_refusal(&self) -> bool {
        match self.refusals.lock() {
            Ok(mut refusals) if *refusals > 0 => {
                *refusals -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(
        &self,
        _profile: &TransportProfile,
    ) -> Result<Box<dyn Transport>, ConnectionError> {
        if self.take_refusal() {
            return Err(ConnectionError::Connect("connection refused".to_string()));
        }

        let (client_tx, server_rx) = mpsc::unbounded_channel();
        let (server_tx, client_rx) = mpsc::unbounded_channel();
        self.accept_tx
            .send(MemoryPeer {
                inbound: server_rx,
                outbound: server_tx,
            })
            .map_err(|_| ConnectionError::Connect("no acceptor".to_string()))?;

        Ok(Box::new(MemoryTransport {
            tx: Some(client_tx),
            rx: client_rx,
        }))
    }
}

struct MemoryTransport {
    tx: Option<mpsc::UnboundedSender<InboundMessage>>,
    rx: mpsc::UnboundedReceiver<OutboundMessage>,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&mut self, message: &InboundMessage) -> Result<(), ConnectionError> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| ConnectionError::Closed("transport closed".to_string()))?;
        tx.send(message.clone())
            .map_err(|_| ConnectionError::Closed("peer went away".to_string()))
    }

    async fn recv(&mut self) -> Option<Result<OutboundMessage, ConnectionError>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.tx = None;
        self.rx.close();
    }
}
