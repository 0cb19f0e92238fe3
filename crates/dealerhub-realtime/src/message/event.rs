//! The catalogue of realtime domain events.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Domain events broadcast over the realtime connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealtimeEvent {
    VehicleCreated,
    VehicleUpdated,
    VehicleDeleted,
    CustomerCreated,
    CustomerUpdated,
    CustomerDeleted,
    LeadCreated,
    LeadUpdated,
    LeadDeleted,
    JobCreated,
    JobUpdated,
    JobDeleted,
    AppointmentCreated,
    AppointmentUpdated,
    AppointmentDeleted,
    DocumentCreated,
    DocumentUpdated,
    DocumentDeleted,
    PinnedMessageCreated,
    PinnedMessageUpdated,
    PinnedMessageDeleted,
    DashboardUpdated,
    AnalyticsUpdated,
    SystemMaintenance,
    SystemUpdate,
    /// Per-recipient copy of a stored notification.
    NotificationCreated,
}

impl RealtimeEvent {
    /// Resource whose cached read model this event invalidates, if any.
    pub fn resource(&self) -> Option<&'static str> {
        use RealtimeEvent::*;
        match self {
            VehicleCreated | VehicleUpdated | VehicleDeleted => Some("vehicles"),
            CustomerCreated | CustomerUpdated | CustomerDeleted => Some("customers"),
            LeadCreated | LeadUpdated | LeadDeleted => Some("leads"),
            JobCreated | JobUpdated | JobDeleted => Some("jobs"),
            AppointmentCreated | AppointmentUpdated | AppointmentDeleted => Some("appointments"),
            DocumentCreated | DocumentUpdated | DocumentDeleted => Some("documents"),
            PinnedMessageCreated | PinnedMessageUpdated | PinnedMessageDeleted => {
                Some("pinned_messages")
            }
            DashboardUpdated => Some("dashboard"),
            AnalyticsUpdated => Some("analytics"),
            NotificationCreated => Some("notifications"),
            SystemMaintenance | SystemUpdate => None,
        }
    }

    /// The snake_case wire name.
    pub fn as_str(&self) -> &'static str {
        use RealtimeEvent::*;
        match self {
            VehicleCreated => "vehicle_created",
            VehicleUpdated => "vehicle_updated",
            VehicleDeleted => "vehicle_deleted",
            CustomerCreated => "customer_created",
            CustomerUpdated => "customer_updated",
            CustomerDeleted => "customer_deleted",
            LeadCreated => "lead_created",
            LeadUpdated => "lead_updated",
            LeadDeleted => "lead_deleted",
            JobCreated => "job_created",
            JobUpdated => "job_updated",
            JobDeleted => "job_deleted",
            AppointmentCreated => "appointment_created",
            AppointmentUpdated => "appointment_updated",
            AppointmentDeleted => "appointment_deleted",
            DocumentCreated => "document_created",
            DocumentUpdated => "document_updated",
            DocumentDeleted => "document_deleted",
            PinnedMessageCreated => "pinned_message_created",
            PinnedMessageUpdated => "pinned_message_updated",
            PinnedMessageDeleted => "pinned_message_deleted",
            DashboardUpdated => "dashboard_updated",
            AnalyticsUpdated => "analytics_updated",
            SystemMaintenance => "system_maintenance",
            SystemUpdate => "system_update",
            NotificationCreated => "notification_created",
        }
    }
}

impl fmt::Display for RealtimeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_name_matches_serde() {
        for event in [
            RealtimeEvent::PinnedMessageCreated,
            RealtimeEvent::NotificationCreated,
            RealtimeEvent::SystemUpdate,
        ] {
            assert_eq!(
                serde_json::to_value(event).unwrap(),
                serde_json::Value::String(event.as_str().to_string())
            );
        }
    }
}
