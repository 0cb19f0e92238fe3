//! Broadcast of domain events and stored notifications.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use dealerhub_entity::notification::NotificationRecord;
use dealerhub_service::notification::RealtimeChannel;

use crate::connection::manager::ConnectionManager;
use crate::message::builder::{build_event, build_notification_created};
use crate::message::event::RealtimeEvent;
use crate::message::types::ConnectedUser;
use crate::room::personal_room;

/// Publishes events to rooms over the connection manager.
#[derive(Debug, Clone)]
pub struct RealtimeBroadcaster {
    connections: Arc<ConnectionManager>,
}

impl RealtimeBroadcaster {
    /// Creates a new broadcaster.
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    /// Emit a domain event to `room`, or to every authenticated connection
    /// when `room` is `None`. Returns the number of connections reached.
    pub fn emit(
        &self,
        event: RealtimeEvent,
        data: Value,
        actor: Option<&ConnectedUser>,
        room: Option<&str>,
    ) -> usize {
        let message = build_event(event, data, actor, room);
        let reached = match room {
            Some(room) => self.connections.broadcast_to_room(room, &message),
            None => self.connections.broadcast_all(&message),
        };
        debug!(event = %event, room = ?room, reached, "Realtime event emitted");
        reached
    }
}

#[async_trait]
impl RealtimeChannel for RealtimeBroadcaster {
    async fn notification_created(&self, record: &NotificationRecord) -> usize {
        let room = personal_room(record.user_id);
        let reached = self
            .connections
            .broadcast_to_room(&room, &build_notification_created(record));
        debug!(
            notification_id = %record.id,
            user_id = %record.user_id,
            reached,
            "Notification forwarded to personal room"
        );
        reached
    }
}
