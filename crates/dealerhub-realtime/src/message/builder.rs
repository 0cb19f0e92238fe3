//! Builders for outbound messages.

use chrono::Utc;
use serde_json::Value;

use dealerhub_entity::notification::NotificationRecord;

use super::event::RealtimeEvent;
use super::types::{ConnectedUser, ErrorCode, OutboundMessage};
use crate::room::personal_room;

/// Build a domain event message.
pub fn build_event(
    event: RealtimeEvent,
    data: Value,
    actor: Option<&ConnectedUser>,
    room: Option<&str>,
) -> OutboundMessage {
    OutboundMessage::Event {
        event,
        data,
        user_id: actor.map(|a| a.user_id),
        username: actor.map(|a| a.username.clone()),
        timestamp: Utc::now(),
        room: room.map(str::to_string),
    }
}

/// Build the `notification_created` event for a stored notification.
///
/// Falls back to `null` data if the record cannot be serialized.
pub fn build_notification_created(record: &NotificationRecord) -> OutboundMessage {
    let room = personal_room(record.user_id);
    let data = serde_json::to_value(record).unwrap_or(Value::Null);
    build_event(RealtimeEvent::NotificationCreated, data, None, Some(&room))
}

/// Build an error message.
pub fn build_error(code: ErrorCode, message: impl Into<String>) -> OutboundMessage {
    OutboundMessage::Error {
        code,
        message: message.into(),
    }
}
