//! Individual realtime connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc, watch};
use tracing::warn;
use uuid::Uuid;

use dealerhub_core::types::UserId;

use crate::message::types::{ConnectedUser, OutboundMessage};

/// Unique connection identifier.
pub type ConnectionId = Uuid;

/// A handle to a single connection.
///
/// Holds the sender for pushing messages to the client and, once the
/// client has authenticated, its identity.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Identity the connection may claim, when known from a bearer token
    pub expected_user: Option<UserId>,
    /// Authenticated identity
    identity: RwLock<Option<ConnectedUser>>,
    sender: mpsc::Sender<OutboundMessage>,
    /// When the connection was opened
    pub connected_at: DateTime<Utc>,
    last_activity: RwLock<DateTime<Utc>>,
    alive: AtomicBool,
    closed_tx: watch::Sender<bool>,
}

impl ConnectionHandle {
    /// Create a new, unauthenticated connection handle
    pub fn new(sender: mpsc::Sender<OutboundMessage>, expected_user: Option<UserId>) -> Self {
        let now = Utc::now();
        let (closed_tx, _) = watch::channel(false);
        Self {
            id: Uuid::new_v4(),
            expected_user,
            identity: RwLock::new(None),
            sender,
            connected_at: now,
            last_activity: RwLock::new(now),
            alive: AtomicBool::new(true),
            closed_tx,
        }
    }

    /// Queue an outbound message. Returns `false` if it was dropped.
    pub fn send(&self, msg: OutboundMessage) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(msg) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(conn_id = %self.id, "Connection send buffer full, dropping message");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark connection as dead and wake whoever waits on [`closed`](Self::closed)
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.closed_tx.send_replace(true);
    }

    /// Resolves once the connection has been marked dead.
    pub async fn closed(&self) {
        let mut rx = self.closed_tx.subscribe();
        // The sender lives as long as `self`, so this only ends on `true`.
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Update last activity timestamp
    pub async fn touch(&self) {
        *self.last_activity.write().await = Utc::now();
    }

    /// Last time the client sent anything.
    pub async fn last_activity(&self) -> DateTime<Utc> {
        *self.last_activity.read().await
    }

    /// The authenticated identity, if any.
    pub async fn identity(&self) -> Option<ConnectedUser> {
        self.identity.read().await.clone()
    }

    /// Whether the client has authenticated.
    pub async fn is_authenticated(&self) -> bool {
        self.identity.read().await.is_some()
    }

    pub(crate) async fn set_identity(&self, user: ConnectedUser) {
        *self.identity.write().await = Some(user);
    }
}
