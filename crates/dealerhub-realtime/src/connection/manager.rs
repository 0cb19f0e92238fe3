//! Connection manager: connection lifecycle, authentication, rooms, and
//! message routing.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use dealerhub_core::config::realtime::RealtimeConfig;
use dealerhub_core::types::UserId;
use dealerhub_database::store::UserDirectory;
use dealerhub_entity::user::UserRole;

use crate::message::builder::build_error;
use crate::message::types::{ConnectedUser, ErrorCode, InboundMessage, OutboundMessage};
use crate::message::validator::{validate_inbound, validate_room_name};
use crate::room::{RoomKind, RoomRegistry, personal_room};

use super::handle::{ConnectionHandle, ConnectionId};
use super::pool::ConnectionPool;

/// Manages all realtime connections.
pub struct ConnectionManager {
    pool: Arc<ConnectionPool>,
    rooms: Arc<RoomRegistry>,
    users: Arc<dyn UserDirectory>,
    config: RealtimeConfig,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.pool.connection_count())
            .field("users", &self.pool.user_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(
        config: RealtimeConfig,
        rooms: Arc<RoomRegistry>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            pool: Arc::new(ConnectionPool::new()),
            rooms,
            users,
            config,
        }
    }

    /// Registers a new, not yet authenticated connection.
    ///
    /// Returns the handle and the receiver of its outbound messages. When
    /// `expected_user` is set, only that identity may authenticate.
    pub fn open(
        &self,
        expected_user: Option<UserId>,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size.max(1));
        let handle = Arc::new(ConnectionHandle::new(tx, expected_user));
        self.pool.add(handle.clone());
        debug!(conn_id = %handle.id, "Realtime connection opened");
        (handle, rx)
    }

    /// Closes the connection if it has not authenticated within the
    /// configured timeout.
    pub async fn enforce_auth_deadline(&self, handle: Arc<ConnectionHandle>) {
        let deadline = Duration::from_secs(self.config.auth_timeout_seconds);
        tokio::select! {
            _ = tokio::time::sleep(deadline) => {}
            _ = handle.closed() => return,
        }
        if !handle.is_authenticated().await {
            warn!(conn_id = %handle.id, "Authentication timed out, closing connection");
            handle.send(build_error(
                ErrorCode::AuthenticationTimeout,
                "No authenticate message received in time",
            ));
            handle.mark_dead();
        }
    }

    /// Unregisters a connection and drops its room memberships.
    pub async fn close(&self, conn_id: &ConnectionId) {
        let Some(handle) = self.pool.get(conn_id) else {
            return;
        };
        let identity = handle.identity().await;
        let Some((handle, user_gone)) = self
            .pool
            .remove(conn_id, identity.as_ref().map(|u| u.user_id))
        else {
            return;
        };
        handle.mark_dead();
        self.rooms.leave_all(*conn_id);

        info!(
            conn_id = %conn_id,
            user_id = ?identity.as_ref().map(|u| u.user_id),
            "Realtime connection closed"
        );

        if user_gone {
            self.broadcast_connected_users().await;
        }
    }

    /// Processes one inbound text frame.
    pub async fn handle_inbound(&self, conn_id: &ConnectionId, raw: &str) {
        let Some(handle) = self.pool.get(conn_id) else {
            warn!(conn_id = %conn_id, "Message from unknown connection");
            return;
        };
        handle.touch().await;

        if let Err(e) = validate_inbound(raw) {
            handle.send(build_error(ErrorCode::InvalidMessage, e.message));
            return;
        }

        let msg: InboundMessage = match serde_json::from_str(raw) {
            Ok(m) => m,
            Err(e) => {
                handle.send(build_error(
                    ErrorCode::InvalidMessage,
                    format!("Failed to parse message: {e}"),
                ));
                return;
            }
        };

        match msg {
            InboundMessage::Authenticate {
                user_id,
                username,
                role,
            } => self.authenticate(&handle, user_id, &username, role).await,
            InboundMessage::Ping => {
                handle.send(OutboundMessage::Pong);
            }
            InboundMessage::JoinRoom { room } => match handle.identity().await {
                Some(user) => {
                    self.join_room(&handle, &user, &room);
                }
                None => Self::reject_unauthenticated(&handle),
            },
            InboundMessage::LeaveRoom { room } => match handle.identity().await {
                Some(_) => self.leave_room(&handle, &room),
                None => Self::reject_unauthenticated(&handle),
            },
        }
    }

    fn reject_unauthenticated(handle: &ConnectionHandle) {
        handle.send(build_error(
            ErrorCode::NotAuthenticated,
            "Authenticate before sending other messages",
        ));
    }

    /// Verifies a claimed identity against the user directory.
    async fn authenticate(
        &self,
        handle: &Arc<ConnectionHandle>,
        user_id: UserId,
        username: &str,
        role: UserRole,
    ) {
        if let Some(current) = handle.identity().await {
            if current.user_id == user_id {
                handle.send(OutboundMessage::Authenticated {
                    connected_users: self.connected_users().await,
                });
            } else {
                self.reject(handle, user_id, "Connection is already authenticated");
            }
            return;
        }

        if handle.expected_user.is_some_and(|expected| expected != user_id) {
            self.reject(handle, user_id, "Identity does not match the bearer token");
            return;
        }

        let user = match self.users.find_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.reject(handle, user_id, "Unknown user");
                return;
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "User lookup failed during authentication");
                self.reject(handle, user_id, "User directory unavailable");
                return;
            }
        };
        if !user.is_active {
            self.reject(handle, user_id, "User account is inactive");
            return;
        }
        if user.role != role {
            self.reject(handle, user_id, "Role does not match");
            return;
        }

        if user.username != username {
            debug!(
                user_id = %user_id,
                claimed = %username,
                "Claimed username differs from directory, using directory value"
            );
        }
        let identity = ConnectedUser {
            user_id,
            username: user.username.clone(),
            role: user.role,
        };
        handle.set_identity(identity).await;
        let first = self.pool.bind_user(user_id, handle.clone());
        self.rooms.join(&personal_room(user_id), handle.id);

        info!(
            conn_id = %handle.id,
            user_id = %user_id,
            role = %user.role,
            "Realtime connection authenticated"
        );

        handle.send(OutboundMessage::Authenticated {
            connected_users: self.connected_users().await,
        });
        if first {
            self.broadcast_connected_users().await;
        }
    }

    fn reject(&self, handle: &ConnectionHandle, user_id: UserId, reason: &str) {
        warn!(conn_id = %handle.id, user_id = %user_id, reason, "Authentication rejected");
        handle.send(build_error(ErrorCode::AuthenticationRejected, reason));
    }

    /// Joins `room` after validating its name and the caller's access.
    ///
    /// Joining a room twice is acknowledged again without side effects.
    pub fn join_room(&self, handle: &ConnectionHandle, user: &ConnectedUser, room: &str) -> bool {
        if let Err(e) = validate_room_name(room) {
            handle.send(build_error(ErrorCode::InvalidRoom, e.message));
            return false;
        }

        if !self.check_room_permission(user, room) {
            handle.send(build_error(
                ErrorCode::Forbidden,
                format!("Not authorized to join room: {room}"),
            ));
            return false;
        }

        if !self.rooms.is_member(room, handle.id)
            && self.rooms.room_count(handle.id) >= self.config.max_rooms_per_connection
        {
            handle.send(build_error(
                ErrorCode::MaxRooms,
                format!(
                    "Maximum rooms ({}) reached",
                    self.config.max_rooms_per_connection
                ),
            ));
            return false;
        }

        if self.rooms.join(room, handle.id) {
            debug!(conn_id = %handle.id, room = %room, "Joined room");
        }
        handle.send(OutboundMessage::RoomJoined {
            room: room.to_string(),
        });
        true
    }

    /// Leaves `room`. Leaving a room the connection is not in is acknowledged.
    pub fn leave_room(&self, handle: &ConnectionHandle, room: &str) {
        if self.rooms.leave(room, handle.id) {
            debug!(conn_id = %handle.id, room = %room, "Left room");
        }
        handle.send(OutboundMessage::RoomLeft {
            room: room.to_string(),
        });
    }

    /// Checks whether a user may join a room.
    pub fn check_room_permission(&self, user: &ConnectedUser, room: &str) -> bool {
        RoomKind::parse(room).permits(user.user_id, user.role)
    }

    /// Users with at least one authenticated connection.
    pub async fn connected_users(&self) -> Vec<ConnectedUser> {
        let mut users = Vec::new();
        for user_id in self.pool.connected_user_ids() {
            if let Some(handle) = self.pool.get_user_connections(&user_id).first() {
                if let Some(identity) = handle.identity().await {
                    users.push(identity);
                }
            }
        }
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users
    }

    async fn broadcast_connected_users(&self) {
        let msg = OutboundMessage::ConnectedUsersUpdated {
            connected_users: self.connected_users().await,
        };
        for conn in self.pool.authenticated_connections() {
            conn.send(msg.clone());
        }
    }

    /// Sends a message to every connection of a user. Returns how many
    /// connections it was queued on.
    pub fn send_to_user(&self, user_id: &UserId, message: &OutboundMessage) -> usize {
        self.pool
            .get_user_connections(user_id)
            .iter()
            .filter(|conn| conn.send(message.clone()))
            .count()
    }

    /// Broadcasts a message to a room.
    pub fn broadcast_to_room(&self, room: &str, message: &OutboundMessage) -> usize {
        let mut sent = 0;
        for conn_id in self.rooms.members(room) {
            if let Some(handle) = self.pool.get(&conn_id) {
                if handle.send(message.clone()) {
                    sent += 1;
                } else {
                    debug!(conn_id = %conn_id, room = %room, "Broadcast not queued");
                }
            }
        }
        sent
    }

    /// Broadcasts a message to every authenticated connection.
    pub fn broadcast_all(&self, message: &OutboundMessage) -> usize {
        self.pool
            .authenticated_connections()
            .iter()
            .filter(|conn| conn.send(message.clone()))
            .count()
    }

    /// Closes all connections.
    pub fn close_all(&self) {
        let all = self.pool.drain();
        for conn in &all {
            conn.mark_dead();
            self.rooms.leave_all(conn.id);
        }
        info!(count = all.len(), "All realtime connections closed");
    }

    /// Returns the total connection count.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Returns the number of unique connected users.
    pub fn user_count(&self) -> usize {
        self.pool.user_count()
    }

    /// Checks if a user is currently connected.
    pub fn is_user_connected(&self, user_id: &UserId) -> bool {
        !self.pool.get_user_connections(user_id).is_empty()
    }

    /// Rooms a connection is in.
    pub fn rooms_of(&self, conn_id: &ConnectionId) -> Vec<String> {
        let mut rooms: Vec<_> = self.rooms.rooms_of(*conn_id).into_iter().collect();
        rooms.sort();
        rooms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealerhub_database::memory::MemoryDirectory;
    use serde_json::json;

    struct Fixture {
        dir: Arc<MemoryDirectory>,
        manager: ConnectionManager,
    }

    fn fixture() -> Fixture {
        let dir = Arc::new(MemoryDirectory::new());
        let manager = ConnectionManager::new(
            RealtimeConfig {
                max_rooms_per_connection: 4,
                ..Default::default()
            },
            Arc::new(RoomRegistry::new()),
            dir.clone(),
        );
        Fixture { dir, manager }
    }

    fn drain(rx: &mut mpsc::Receiver<OutboundMessage>) -> Vec<OutboundMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn auth_frame(user_id: UserId, username: &str, role: &str) -> String {
        json!({"type": "authenticate", "user_id": user_id, "username": username, "role": role})
            .to_string()
    }

    fn error_code(msgs: &[OutboundMessage]) -> Option<ErrorCode> {
        msgs.iter().find_map(|m| match m {
            OutboundMessage::Error { code, .. } => Some(*code),
            _ => None,
        })
    }

    #[tokio::test]
    async fn test_authenticate_joins_personal_room() {
        let f = fixture();
        let alice = f.dir.add_user("alice", UserRole::Admin);
        let (handle, mut rx) = f.manager.open(None);

        f.manager
            .handle_inbound(&handle.id, &auth_frame(alice, "alice", "admin"))
            .await;

        let msgs = drain(&mut rx);
        assert!(matches!(
            &msgs[0],
            OutboundMessage::Authenticated { connected_users } if connected_users.len() == 1
        ));
        assert_eq!(f.manager.rooms_of(&handle.id), vec![personal_room(alice)]);
        assert!(f.manager.is_user_connected(&alice));
    }

    #[tokio::test]
    async fn test_authenticate_rejections() {
        let f = fixture();
        let inactive = f.dir.add_user("ivan", UserRole::Technician);
        f.dir.set_active(inactive, false);
        let sam = f.dir.add_user("sam", UserRole::Salesperson);

        for frame in [
            auth_frame(UserId::new(), "ghost", "admin"),
            auth_frame(inactive, "ivan", "technician"),
            auth_frame(sam, "sam", "admin"),
        ] {
            let (handle, mut rx) = f.manager.open(None);
            f.manager.handle_inbound(&handle.id, &frame).await;
            assert_eq!(error_code(&drain(&mut rx)), Some(ErrorCode::AuthenticationRejected));
            assert!(!handle.is_authenticated().await);
        }
        assert_eq!(f.manager.user_count(), 0);
    }

    #[tokio::test]
    async fn test_token_identity_must_match() {
        let f = fixture();
        let alice = f.dir.add_user("alice", UserRole::Admin);
        let bob = f.dir.add_user("bob", UserRole::Manager);
        let (handle, mut rx) = f.manager.open(Some(alice));

        f.manager
            .handle_inbound(&handle.id, &auth_frame(bob, "bob", "manager"))
            .await;

        assert_eq!(error_code(&drain(&mut rx)), Some(ErrorCode::AuthenticationRejected));
    }

    #[tokio::test]
    async fn test_rooms_require_authentication() {
        let f = fixture();
        let (handle, mut rx) = f.manager.open(None);

        f.manager
            .handle_inbound(&handle.id, r#"{"type":"join_room","room":"sales"}"#)
            .await;

        assert_eq!(error_code(&drain(&mut rx)), Some(ErrorCode::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_room_permissions_and_idempotent_join() {
        let f = fixture();
        let sam = f.dir.add_user("sam", UserRole::Salesperson);
        let other = UserId::new();
        let (handle, mut rx) = f.manager.open(None);
        f.manager
            .handle_inbound(&handle.id, &auth_frame(sam, "sam", "salesperson"))
            .await;
        drain(&mut rx);

        let foreign = personal_room(other);
        for room in ["admin", "management", foreign.as_str()] {
            let frame = json!({"type": "join_room", "room": room}).to_string();
            f.manager.handle_inbound(&handle.id, &frame).await;
            assert_eq!(error_code(&drain(&mut rx)), Some(ErrorCode::Forbidden), "{room}");
        }

        f.manager
            .handle_inbound(&handle.id, r#"{"type":"join_room","room":"sales floor"}"#)
            .await;
        assert_eq!(error_code(&drain(&mut rx)), Some(ErrorCode::InvalidRoom));

        for _ in 0..2 {
            f.manager
                .handle_inbound(&handle.id, r#"{"type":"join_room","room":"sales"}"#)
                .await;
            assert_eq!(
                drain(&mut rx),
                vec![OutboundMessage::RoomJoined { room: "sales".into() }]
            );
        }
        assert_eq!(f.manager.rooms_of(&handle.id).len(), 2);
    }

    #[tokio::test]
    async fn test_room_limit() {
        let f = fixture();
        let sam = f.dir.add_user("sam", UserRole::Salesperson);
        let (handle, mut rx) = f.manager.open(None);
        f.manager
            .handle_inbound(&handle.id, &auth_frame(sam, "sam", "salesperson"))
            .await;

        for room in ["sales", "dashboard", "system"] {
            let frame = json!({"type": "join_room", "room": room}).to_string();
            f.manager.handle_inbound(&handle.id, &frame).await;
        }
        drain(&mut rx);

        f.manager
            .handle_inbound(&handle.id, r#"{"type":"join_room","room":"notifications"}"#)
            .await;
        assert_eq!(error_code(&drain(&mut rx)), Some(ErrorCode::MaxRooms));
    }

    #[tokio::test]
    async fn test_connected_users_updates() {
        let f = fixture();
        let alice = f.dir.add_user("alice", UserRole::Admin);
        let bob = f.dir.add_user("bob", UserRole::Manager);

        let (a, mut a_rx) = f.manager.open(None);
        f.manager
            .handle_inbound(&a.id, &auth_frame(alice, "alice", "admin"))
            .await;
        drain(&mut a_rx);

        let (b, mut b_rx) = f.manager.open(None);
        f.manager
            .handle_inbound(&b.id, &auth_frame(bob, "bob", "manager"))
            .await;
        assert!(drain(&mut a_rx).iter().any(|m| matches!(
            m,
            OutboundMessage::ConnectedUsersUpdated { connected_users } if connected_users.len() == 2
        )));
        drain(&mut b_rx);

        f.manager.close(&b.id).await;
        assert!(drain(&mut a_rx).iter().any(|m| matches!(
            m,
            OutboundMessage::ConnectedUsersUpdated { connected_users } if connected_users.len() == 1
        )));
        assert_eq!(f.manager.connection_count(), 1);
        assert!(!f.manager.is_user_connected(&bob));
    }

    #[tokio::test]
    async fn test_ping_and_garbage() {
        let f = fixture();
        let (handle, mut rx) = f.manager.open(None);

        f.manager.handle_inbound(&handle.id, r#"{"type":"ping"}"#).await;
        f.manager.handle_inbound(&handle.id, "not json").await;

        let msgs = drain(&mut rx);
        assert_eq!(msgs[0], OutboundMessage::Pong);
        assert_eq!(error_code(&msgs[1..]), Some(ErrorCode::InvalidMessage));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_deadline_closes_connection() {
        let f = fixture();
        let (handle, mut rx) = f.manager.open(None);

        f.manager.enforce_auth_deadline(handle.clone()).await;

        assert!(!handle.is_alive());
        assert_eq!(error_code(&drain(&mut rx)), Some(ErrorCode::AuthenticationTimeout));
    }

    #[tokio::test]
    async fn test_broadcast_to_room() {
        let f = fixture();
        let alice = f.dir.add_user("alice", UserRole::Admin);
        let tom = f.dir.add_user("tom", UserRole::Technician);
        let (a, mut a_rx) = f.manager.open(None);
        let (t, mut t_rx) = f.manager.open(None);
        f.manager
            .handle_inbound(&a.id, &auth_frame(alice, "alice", "admin"))
            .await;
        f.manager
            .handle_inbound(&t.id, &auth_frame(tom, "tom", "technician"))
            .await;
        f.manager
            .handle_inbound(&t.id, r#"{"type":"join_room","room":"workshop"}"#)
            .await;
        drain(&mut a_rx);
        drain(&mut t_rx);

        let sent = f.manager.broadcast_to_room("workshop", &OutboundMessage::Pong);

        assert_eq!(sent, 1);
        assert!(drain(&mut a_rx).is_empty());
        assert_eq!(drain(&mut t_rx), vec![OutboundMessage::Pong]);
    }
}
