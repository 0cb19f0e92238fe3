//! Connection pool: every open connection, and authenticated ones by user.

use std::sync::Arc;

use dashmap::DashMap;

use dealerhub_core::types::UserId;

use super::handle::{ConnectionHandle, ConnectionId};

/// Thread-safe pool of open connections.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// Connection ID → handle, authenticated or not.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
    /// User ID → authenticated connections (one user can have several).
    by_user: DashMap<UserId, Vec<Arc<ConnectionHandle>>>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a freshly opened connection.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.by_id.insert(handle.id, handle);
    }

    /// Indexes an authenticated connection under its user.
    ///
    /// Returns `true` when this is the user's first connection.
    pub fn bind_user(&self, user_id: UserId, handle: Arc<ConnectionHandle>) -> bool {
        let mut connections = self.by_user.entry(user_id).or_default();
        let first = connections.is_empty();
        if !connections.iter().any(|c| c.id == handle.id) {
            connections.push(handle);
        }
        first
    }

    /// Removes a connection from the pool.
    ///
    /// Returns the handle and whether its user has no connections left.
    pub fn remove(
        &self,
        conn_id: &ConnectionId,
        user_id: Option<UserId>,
    ) -> Option<(Arc<ConnectionHandle>, bool)> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        let mut user_gone = false;
        if let Some(user_id) = user_id {
            if let Some(mut connections) = self.by_user.get_mut(&user_id) {
                connections.retain(|c| c.id != *conn_id);
                if connections.is_empty() {
                    drop(connections);
                    user_gone = self
                        .by_user
                        .remove_if(&user_id, |_, c| c.is_empty())
                        .is_some();
                }
            }
        }
        Some((handle, user_gone))
    }

    /// Gets all authenticated connections for a user.
    pub fn get_user_connections(&self, user_id: &UserId) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Returns total number of open connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns number of unique authenticated users.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    /// Returns all connection handles.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Returns all authenticated connection handles.
    pub fn authenticated_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect()
    }

    /// Returns all authenticated user IDs.
    pub fn connected_user_ids(&self) -> Vec<UserId> {
        self.by_user.iter().map(|entry| *entry.key()).collect()
    }

    /// Removes every connection.
    pub fn drain(&self) -> Vec<Arc<ConnectionHandle>> {
        let all = self.all_connections();
        self.by_id.clear();
        self.by_user.clear();
        all
    }
}
