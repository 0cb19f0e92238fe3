//! Top-level realtime engine that ties the subsystems together.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use dealerhub_core::config::realtime::RealtimeConfig;
use dealerhub_database::store::UserDirectory;

use crate::broadcast::RealtimeBroadcaster;
use crate::connection::manager::ConnectionManager;
use crate::room::registry::RoomRegistry;

/// Central realtime engine.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection manager.
    pub connections: Arc<ConnectionManager>,
    /// Room registry.
    pub rooms: Arc<RoomRegistry>,
    /// Event and notification broadcaster.
    pub broadcaster: Arc<RealtimeBroadcaster>,
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine")
            .field("connections", &self.connections)
            .finish_non_exhaustive()
    }
}

impl RealtimeEngine {
    /// Creates a new realtime engine.
    pub fn new(config: RealtimeConfig, users: Arc<dyn UserDirectory>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let rooms = Arc::new(RoomRegistry::new());
        let connections = Arc::new(ConnectionManager::new(config, rooms.clone(), users));
        let broadcaster = Arc::new(RealtimeBroadcaster::new(connections.clone()));

        info!("Realtime engine initialized");

        Self {
            connections,
            rooms,
            broadcaster,
            shutdown_tx,
        }
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signals shutdown and closes every connection.
    pub fn shutdown(&self) {
        info!("Shutting down realtime engine");
        let _ = self.shutdown_tx.send(());
        self.connections.close_all();
    }
}
