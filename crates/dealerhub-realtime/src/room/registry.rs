//! Room registry: room name → member connections.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::connection::handle::ConnectionId;

use super::membership::MembershipTracker;

/// Registry of all non-empty rooms.
///
/// Rooms exist implicitly while they have members.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, HashSet<ConnectionId>>,
    memberships: MembershipTracker,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to a room. Returns `false` if it was already a member.
    pub fn join(&self, room: &str, conn_id: ConnectionId) -> bool {
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(conn_id);
        self.memberships.add(conn_id, room.to_string())
    }

    /// Removes a connection from a room. Returns `false` if it was not a member.
    pub fn leave(&self, room: &str, conn_id: ConnectionId) -> bool {
        self.detach(room, conn_id);
        self.memberships.remove(conn_id, room)
    }

    /// Removes a connection from every room it is in.
    pub fn leave_all(&self, conn_id: ConnectionId) -> HashSet<String> {
        let rooms = self.memberships.remove_all(conn_id);
        for room in &rooms {
            self.detach(room, conn_id);
        }
        rooms
    }

    fn detach(&self, room: &str, conn_id: ConnectionId) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(&conn_id);
            if members.is_empty() {
                drop(members);
                self.rooms.remove_if(room, |_, m| m.is_empty());
            }
        }
    }

    /// Member connections of a room.
    pub fn members(&self, room: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether the connection is in `room`.
    pub fn is_member(&self, room: &str, conn_id: ConnectionId) -> bool {
        self.memberships.contains(conn_id, room)
    }

    /// Rooms the connection is in.
    pub fn rooms_of(&self, conn_id: ConnectionId) -> HashSet<String> {
        self.memberships.rooms(conn_id)
    }

    /// Number of rooms the connection is in.
    pub fn room_count(&self, conn_id: ConnectionId) -> usize {
        self.memberships.count(conn_id)
    }

    /// Number of non-empty rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no room has members.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_join_is_idempotent() {
        let rooms = RoomRegistry::new();
        let conn = Uuid::new_v4();
        assert!(rooms.join("sales", conn));
        assert!(!rooms.join("sales", conn));
        assert_eq!(rooms.members("sales"), vec![conn]);
        assert_eq!(rooms.room_count(conn), 1);
    }

    #[test]
    fn test_empty_rooms_disappear() {
        let rooms = RoomRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        rooms.join("dashboard", a);
        rooms.join("dashboard", b);
        rooms.join("sales", a);

        assert!(rooms.leave("dashboard", a));
        assert!(!rooms.leave("dashboard", a));
        assert_eq!(rooms.members("dashboard"), vec![b]);

        let left = rooms.leave_all(a);
        assert!(left.contains("sales"));
        assert_eq!(rooms.len(), 1);
        assert!(rooms.members("sales").is_empty());
    }
}
