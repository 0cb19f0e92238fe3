//! Observable session state.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use dealerhub_realtime::message::ConnectedUser;

use crate::error::ConnectionError;

/// Session lifecycle.
///
/// `Disconnected → Connecting → Connected`; a lost or failed connection
/// moves to `Reconnecting`; exhausted attempts end in `Error` until
/// [`retry`](super::ConnectionSession::retry).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the UI sees of a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub status: ConnectionStatus,
    /// Reconnect attempts since the last successful connection.
    pub reconnect_attempts: u32,
    /// Rooms the server confirmed; rejoined after every reconnect.
    pub joined_rooms: BTreeSet<String>,
    /// Cleared whenever the connection drops.
    pub connected_users: Vec<ConnectedUser>,
    pub last_error: Option<ConnectionError>,
}

impl SessionSnapshot {
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }
}
