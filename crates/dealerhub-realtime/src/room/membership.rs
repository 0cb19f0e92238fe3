//! Reverse index: which rooms each connection is in.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::connection::handle::ConnectionId;

/// Connection → set of room names.
#[derive(Debug, Default)]
pub struct MembershipTracker {
    by_connection: DashMap<ConnectionId, HashSet<String>>,
}

impl MembershipTracker {
    /// Creates a new tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a membership. Returns `false` if it already existed.
    pub fn add(&self, conn_id: ConnectionId, room: String) -> bool {
        self.by_connection.entry(conn_id).or_default().insert(room)
    }

    /// Removes a membership. Returns `false` if there was none.
    pub fn remove(&self, conn_id: ConnectionId, room: &str) -> bool {
        self.by_connection
            .get_mut(&conn_id)
            .map(|mut rooms| rooms.remove(room))
            .unwrap_or(false)
    }

    /// Whether the connection is in `room`.
    pub fn contains(&self, conn_id: ConnectionId, room: &str) -> bool {
        self.by_connection
            .get(&conn_id)
            .is_some_and(|rooms| rooms.contains(room))
    }

    /// Rooms the connection is in.
    pub fn rooms(&self, conn_id: ConnectionId) -> HashSet<String> {
        self.by_connection
            .get(&conn_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Number of rooms the connection is in.
    pub fn count(&self, conn_id: ConnectionId) -> usize {
        self.by_connection
            .get(&conn_id)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }

    /// Forget the connection, returning the rooms it was in.
    pub fn remove_all(&self, conn_id: ConnectionId) -> HashSet<String> {
        self.by_connection
            .remove(&conn_id)
            .map(|(_, rooms)| rooms)
            .unwrap_or_default()
    }
}
