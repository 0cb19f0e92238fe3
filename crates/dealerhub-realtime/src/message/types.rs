//! Inbound and outbound message type definitions.
//!
//! Every frame is a JSON text frame tagged by `type`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dealerhub_core::types::UserId;
use dealerhub_entity::user::UserRole;

use super::event::RealtimeEvent;

/// Messages sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Claim an identity; must be the first message on a connection.
    Authenticate {
        user_id: UserId,
        username: String,
        role: UserRole,
    },
    /// Join a room.
    JoinRoom { room: String },
    /// Leave a room.
    LeaveRoom { room: String },
    /// Keepalive.
    Ping,
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Authentication accepted.
    Authenticated { connected_users: Vec<ConnectedUser> },
    /// Room join confirmed.
    RoomJoined { room: String },
    /// Room leave confirmed.
    RoomLeft { room: String },
    /// The set of connected users changed.
    ConnectedUsersUpdated { connected_users: Vec<ConnectedUser> },
    /// A domain event.
    Event {
        event: RealtimeEvent,
        data: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<UserId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        timestamp: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<String>,
    },
    /// Reply to `ping`.
    Pong,
    /// A request was refused.
    Error { code: ErrorCode, message: String },
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The claimed identity was refused.
    AuthenticationRejected,
    /// No `authenticate` arrived in time.
    AuthenticationTimeout,
    /// A request other than `authenticate` arrived before authentication.
    NotAuthenticated,
    /// The frame was not a valid message.
    InvalidMessage,
    /// The room name is malformed.
    InvalidRoom,
    /// The room is restricted.
    Forbidden,
    /// The connection is in too many rooms.
    MaxRooms,
}

impl ErrorCode {
    /// The wire form of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationRejected => "AUTHENTICATION_REJECTED",
            Self::AuthenticationTimeout => "AUTHENTICATION_TIMEOUT",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::InvalidMessage => "INVALID_MESSAGE",
            Self::InvalidRoom => "INVALID_ROOM",
            Self::Forbidden => "FORBIDDEN",
            Self::MaxRooms => "MAX_ROOMS",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user with at least one authenticated connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedUser {
    pub user_id: UserId,
    pub username: String,
    pub role: UserRole,
}
