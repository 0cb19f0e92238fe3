//! Closed set of domain events that produce notifications.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A domain event type known to the notification registry.
///
/// The string form (`"vehicle.sold"`) is the stable key used by callers,
/// on the wire, in storage, and as the per-event preference key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_event_type")]
pub enum EventType {
    #[serde(rename = "vehicle.created")]
    #[sqlx(rename = "vehicle.created")]
    VehicleCreated,
    #[serde(rename = "vehicle.updated")]
    #[sqlx(rename = "vehicle.updated")]
    VehicleUpdated,
    #[serde(rename = "vehicle.sold")]
    #[sqlx(rename = "vehicle.sold")]
    VehicleSold,
    #[serde(rename = "vehicle.reserved")]
    #[sqlx(rename = "vehicle.reserved")]
    VehicleReserved,
    #[serde(rename = "customer.created")]
    #[sqlx(rename = "customer.created")]
    CustomerCreated,
    #[serde(rename = "lead.created")]
    #[sqlx(rename = "lead.created")]
    LeadCreated,
    #[serde(rename = "lead.assigned")]
    #[sqlx(rename = "lead.assigned")]
    LeadAssigned,
    #[serde(rename = "lead.status_changed")]
    #[sqlx(rename = "lead.status_changed")]
    LeadStatusChanged,
    #[serde(rename = "job.booked")]
    #[sqlx(rename = "job.booked")]
    JobBooked,
    #[serde(rename = "job.completed")]
    #[sqlx(rename = "job.completed")]
    JobCompleted,
    #[serde(rename = "appointment.booked")]
    #[sqlx(rename = "appointment.booked")]
    AppointmentBooked,
    #[serde(rename = "appointment.cancelled")]
    #[sqlx(rename = "appointment.cancelled")]
    AppointmentCancelled,
    #[serde(rename = "document.uploaded")]
    #[sqlx(rename = "document.uploaded")]
    DocumentUploaded,
    #[serde(rename = "invoice.paid")]
    #[sqlx(rename = "invoice.paid")]
    InvoicePaid,
    #[serde(rename = "system.maintenance")]
    #[sqlx(rename = "system.maintenance")]
    SystemMaintenance,
}

impl EventType {
    /// Every known event type.
    pub const ALL: [EventType; 15] = [
        Self::VehicleCreated,
        Self::VehicleUpdated,
        Self::VehicleSold,
        Self::VehicleReserved,
        Self::CustomerCreated,
        Self::LeadCreated,
        Self::LeadAssigned,
        Self::LeadStatusChanged,
        Self::JobBooked,
        Self::JobCompleted,
        Self::AppointmentBooked,
        Self::AppointmentCancelled,
        Self::DocumentUploaded,
        Self::InvoicePaid,
        Self::SystemMaintenance,
    ];

    /// Return the dotted key, e.g. `"vehicle.sold"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VehicleCreated => "vehicle.created",
            Self::VehicleUpdated => "vehicle.updated",
            Self::VehicleSold => "vehicle.sold",
            Self::VehicleReserved => "vehicle.reserved",
            Self::CustomerCreated => "customer.created",
            Self::LeadCreated => "lead.created",
            Self::LeadAssigned => "lead.assigned",
            Self::LeadStatusChanged => "lead.status_changed",
            Self::JobBooked => "job.booked",
            Self::JobCompleted => "job.completed",
            Self::AppointmentBooked => "appointment.booked",
            Self::AppointmentCancelled => "appointment.cancelled",
            Self::DocumentUploaded => "document.uploaded",
            Self::InvoicePaid => "invoice.paid",
            Self::SystemMaintenance => "system.maintenance",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventType {
    type Err = dealerhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| dealerhub_core::AppError::validation(format!("Unknown event type: '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_keys_round_trip() {
        for event in EventType::ALL {
            assert_eq!(event.as_str().parse::<EventType>().unwrap(), event);
        }
    }

    #[test]
    fn test_serde_uses_dotted_key() {
        let json = serde_json::to_string(&EventType::LeadStatusChanged).unwrap();
        assert_eq!(json, "\"lead.status_changed\"");
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!("vehicle.exploded".parse::<EventType>().is_err());
        assert!("VEHICLE.SOLD".parse::<EventType>().is_err());
    }
}
