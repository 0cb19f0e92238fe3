//! The trigger entry point: domain event in, notifications out.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use dealerhub_core::types::{NotificationId, UserId};
use dealerhub_entity::notification::EventType;

use super::channel::RealtimeChannel;
use super::registry::{EventDefinition, EventRegistry, RenderedNotification};
use super::resolver::{Exclusion, RecipientResolver};
use super::writer::NotificationWriter;
use crate::push::{DeliverySummary, PushService};

/// How a trigger call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// At least one recipient was processed.
    Dispatched,
    /// The event resolved to nobody.
    NoRecipients,
    /// The event type is not in the registry.
    UnknownEventType,
}

/// What happened for one recipient.
#[derive(Debug, Clone)]
pub struct RecipientReport {
    pub user_id: UserId,
    /// `None` when the record could not be written; nothing was sent then.
    pub notification_id: Option<NotificationId>,
    pub push: DeliverySummary,
    /// Live realtime connections the record reached.
    pub realtime_connections: usize,
    /// Whether the record was marked delivered.
    pub delivered: bool,
}

/// Summary of one trigger call.
#[derive(Debug, Clone)]
pub struct TriggerReport {
    pub event_type: String,
    pub outcome: TriggerOutcome,
    pub recipients: Vec<RecipientReport>,
    pub excluded: Vec<(UserId, Exclusion)>,
}

impl TriggerReport {
    fn empty(event_type: &str, outcome: TriggerOutcome) -> Self {
        Self {
            event_type: event_type.to_string(),
            outcome,
            recipients: Vec::new(),
            excluded: Vec::new(),
        }
    }

    /// Number of notification records written.
    pub fn records_written(&self) -> usize {
        self.recipients
            .iter()
            .filter(|r| r.notification_id.is_some())
            .count()
    }

    /// Total push attempts across all recipients.
    pub fn push_attempts(&self) -> usize {
        self.recipients.iter().map(|r| r.push.attempted()).sum()
    }
}

/// Turns a domain event into per-recipient notifications delivered over
/// push and realtime.
///
/// Never fails towards the caller: every per-recipient problem is logged
/// and reflected in the [`TriggerReport`].
pub struct EventTrigger {
    registry: Arc<EventRegistry>,
    resolver: RecipientResolver,
    writer: NotificationWriter,
    push: Arc<PushService>,
    realtime: Arc<dyn RealtimeChannel>,
}

impl fmt::Debug for EventTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTrigger")
            .field("events", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl EventTrigger {
    /// Creates a new trigger.
    pub fn new(
        registry: Arc<EventRegistry>,
        resolver: RecipientResolver,
        writer: NotificationWriter,
        push: Arc<PushService>,
        realtime: Arc<dyn RealtimeChannel>,
    ) -> Self {
        Self {
            registry,
            resolver,
            writer,
            push,
            realtime,
        }
    }

    /// Run the pipeline for one occurrence of `event_type`.
    pub async fn trigger(
        &self,
        event_type: &str,
        payload: Value,
        triggered_by: UserId,
    ) -> TriggerReport {
        let Some(definition) = self.registry.lookup_str(event_type) else {
            warn!(event_type = %event_type, "Unknown event type, nothing to notify");
            return TriggerReport::empty(event_type, TriggerOutcome::UnknownEventType);
        };

        let rendered = definition.render(&payload);
        let resolution = self.resolver.resolve(definition, triggered_by).await;

        if resolution.recipients.is_empty() {
            debug!(
                event_type = %definition.event_type,
                excluded = resolution.excluded.len(),
                "No eligible recipients"
            );
            let mut report = TriggerReport::empty(event_type, TriggerOutcome::NoRecipients);
            report.excluded = resolution.excluded;
            return report;
        }

        let recipients = join_all(
            resolution
                .recipients
                .iter()
                .map(|&user_id| self.notify_recipient(definition, &rendered, &payload, user_id)),
        )
        .await;

        let report = TriggerReport {
            event_type: event_type.to_string(),
            outcome: TriggerOutcome::Dispatched,
            recipients,
            excluded: resolution.excluded,
        };

        info!(
            event_type = %definition.event_type,
            triggered_by = %triggered_by,
            recipients = report.recipients.len(),
            excluded = report.excluded.len(),
            push_attempts = report.push_attempts(),
            "Event notifications dispatched"
        );
        report
    }

    /// Fire-and-forget variant of [`trigger`](Self::trigger) on a detached task.
    pub fn spawn(
        self: &Arc<Self>,
        event_type: impl Into<String>,
        payload: Value,
        triggered_by: UserId,
    ) -> JoinHandle<TriggerReport> {
        let this = Arc::clone(self);
        let event_type = event_type.into();
        tokio::spawn(async move { this.trigger(&event_type, payload, triggered_by).await })
    }

    /// Whether `event_type` is known.
    pub fn is_known(&self, event_type: &str) -> bool {
        event_type
            .parse::<EventType>()
            .ok()
            .and_then(|t| self.registry.lookup(t))
            .is_some()
    }

    async fn notify_recipient(
        &self,
        definition: &EventDefinition,
        rendered: &RenderedNotification,
        payload: &Value,
        user_id: UserId,
    ) -> RecipientReport {
        let record = match self.writer.write(definition, rendered, payload, user_id).await {
            Ok(record) => record,
            Err(e) => {
                error!(
                    event_type = %definition.event_type,
                    user_id = %user_id,
                    error = %e,
                    "Failed to write notification record"
                );
                return RecipientReport {
                    user_id,
                    notification_id: None,
                    push: DeliverySummary::default(),
                    realtime_connections: 0,
                    delivered: false,
                };
            }
        };

        let (push, realtime_connections) = tokio::join!(
            self.push.notify(&record),
            self.realtime.notification_created(&record)
        );

        let delivered = if push.sent > 0 {
            match self.writer.mark_delivered(&record).await {
                Ok(updated) => updated,
                Err(e) => {
                    warn!(
                        notification_id = %record.id,
                        error = %e,
                        "Failed to mark notification delivered"
                    );
                    false
                }
            }
        } else {
            false
        };

        RecipientReport {
            user_id,
            notification_id: Some(record.id),
            push,
            realtime_connections,
            delivered,
        }
    }
}
