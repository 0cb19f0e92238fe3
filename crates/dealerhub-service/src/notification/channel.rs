//! Seam between the trigger and the realtime broadcast service.

use async_trait::async_trait;

use dealerhub_entity::notification::NotificationRecord;

/// Ephemeral delivery of a freshly written notification.
///
/// Implemented by the realtime engine, which forwards the record to the
/// recipient's personal room.
#[async_trait]
pub trait RealtimeChannel: Send + Sync {
    /// Forward `record` to its recipient; returns the number of live
    /// connections it reached.
    async fn notification_created(&self, record: &NotificationRecord) -> usize;
}
