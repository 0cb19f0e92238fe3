//! The event registry: one immutable definition per notifying event.

use std::collections::HashMap;

use serde_json::Value;

use dealerhub_entity::notification::{EventType, NotificationCategory, NotificationPriority};
use dealerhub_entity::user::UserRole;

use super::template;

/// Who may be told about an event.
#[derive(Debug, Clone)]
pub struct RecipientCriteria {
    /// Roles that may receive the notification.
    pub allowed_roles: Vec<UserRole>,
    /// Page whose explicit `hidden` permission excludes a user.
    pub page: String,
    /// Key of the per-event preference switch.
    pub preference_key: EventType,
}

impl RecipientCriteria {
    /// Whether `role` is in the allowed set.
    pub fn allows_role(&self, role: UserRole) -> bool {
        self.allowed_roles.contains(&role)
    }
}

/// Static description of how one event type becomes a notification.
#[derive(Debug, Clone)]
pub struct EventDefinition {
    pub event_type: EventType,
    pub category: NotificationCategory,
    pub priority: NotificationPriority,
    pub title_template: String,
    pub body_template: String,
    pub action_url: String,
    /// Related entity type, e.g. `"vehicle"`.
    pub entity_type: String,
    /// Payload key carrying the related entity's id.
    pub entity_id_key: String,
    pub criteria: RecipientCriteria,
}

/// A definition rendered against one trigger payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotification {
    pub title: String,
    pub message: String,
    pub action_url: String,
    pub entity_id: Option<String>,
}

impl EventDefinition {
    #[allow(clippy::too_many_arguments)]
    fn new(
        event_type: EventType,
        category: NotificationCategory,
        priority: NotificationPriority,
        title_template: &str,
        body_template: &str,
        action_url: &str,
        entity_type: &str,
        allowed_roles: &[UserRole],
    ) -> Self {
        Self {
            event_type,
            category,
            priority,
            title_template: title_template.to_string(),
            body_template: body_template.to_string(),
            action_url: action_url.to_string(),
            entity_type: entity_type.to_string(),
            entity_id_key: format!("{entity_type}_id"),
            criteria: RecipientCriteria {
                allowed_roles: allowed_roles.to_vec(),
                page: page_of(action_url),
                preference_key: event_type,
            },
        }
    }

    /// Render title, body, and link against a trigger payload.
    pub fn render(&self, payload: &Value) -> RenderedNotification {
        let entity_id = payload
            .get(&self.entity_id_key)
            .filter(|v| !v.is_null())
            .map(|v| template::value_text(Some(v)));

        RenderedNotification {
            title: template::render(&self.title_template, payload),
            message: template::render(&self.body_template, payload),
            action_url: template::render(&self.action_url, payload),
            entity_id,
        }
    }
}

/// First path segment of an action URL template, e.g. `/sales/{id}` → `sales`.
fn page_of(action_url: &str) -> String {
    action_url
        .trim_start_matches('/')
        .split(['/', '?', '#', '{'])
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Lookup table of every event that produces notifications.
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct EventRegistry {
    definitions: HashMap<EventType, EventDefinition>,
}

impl EventRegistry {
    /// Build a registry from explicit definitions.
    pub fn from_definitions(definitions: impl IntoIterator<Item = EventDefinition>) -> Self {
        Self {
            definitions: definitions
                .into_iter()
                .map(|d| (d.event_type, d))
                .collect(),
        }
    }

    /// The dealership's standard event catalogue.
    pub fn standard() -> Self {
        use NotificationCategory as C;
        use NotificationPriority as P;
        use UserRole::*;

        let sales_floor = [Admin, Manager, Salesperson];
        let management = [Admin, Manager];
        let workshop = [Admin, Manager, Technician, Receptionist];
        let everyone = UserRole::ALL;

        Self::from_definitions([
            EventDefinition::new(
                EventType::VehicleCreated,
                C::Inventory,
                P::Medium,
                "New vehicle in stock",
                "{username} added {make} {model} ({registration}) to inventory",
                "/inventory/{vehicle_id}",
                "vehicle",
                &sales_floor,
            ),
            EventDefinition::new(
                EventType::VehicleUpdated,
                C::Inventory,
                P::Low,
                "Vehicle updated",
                "{username} updated '{registration}'",
                "/inventory/{vehicle_id}",
                "vehicle",
                &management,
            ),
            EventDefinition::new(
                EventType::VehicleSold,
                C::Sales,
                P::High,
                "Vehicle sold",
                "{username} sold '{registration}' for {sale_price}",
                "/sales/{vehicle_id}",
                "vehicle",
                &sales_floor,
            ),
            EventDefinition::new(
                EventType::VehicleReserved,
                C::Sales,
                P::Medium,
                "Vehicle reserved",
                "{username} reserved '{registration}' for {customer_name}",
                "/sales/{vehicle_id}",
                "vehicle",
                &sales_floor,
            ),
            EventDefinition::new(
                EventType::CustomerCreated,
                C::Customers,
                P::Low,
                "New customer",
                "{username} added customer {customer_name}",
                "/customers/{customer_id}",
                "customer",
                &[Admin, Manager, Salesperson, Receptionist],
            ),
            EventDefinition::new(
                EventType::LeadCreated,
                C::Leads,
                P::Medium,
                "New lead",
                "New lead from {customer_name} via {source}",
                "/leads/{lead_id}",
                "lead",
                &sales_floor,
            ),
            EventDefinition::new(
                EventType::LeadAssigned,
                C::Leads,
                P::High,
                "Lead assigned",
                "{username} assigned the lead for {customer_name} to {assignee_name}",
                "/leads/{lead_id}",
                "lead",
                &sales_floor,
            ),
            EventDefinition::new(
                EventType::LeadStatusChanged,
                C::Leads,
                P::Low,
                "Lead status changed",
                "Lead for {customer_name} moved from {old_status} to {new_status}",
                "/leads/{lead_id}",
                "lead",
                &sales_floor,
            ),
            EventDefinition::new(
                EventType::JobBooked,
                C::Workshop,
                P::Medium,
                "Workshop job booked",
                "{username} booked {job_type} for '{registration}' on {scheduled_date}",
                "/workshop/{job_id}",
                "job",
                &workshop,
            ),
            EventDefinition::new(
                EventType::JobCompleted,
                C::Workshop,
                P::Medium,
                "Workshop job completed",
                "{job_type} for '{registration}' is complete",
                "/workshop/{job_id}",
                "job",
                &workshop,
            ),
            EventDefinition::new(
                EventType::AppointmentBooked,
                C::Calendar,
                P::Medium,
                "Appointment booked",
                "{customer_name} booked for {appointment_time}",
                "/calendar/{appointment_id}",
                "appointment",
                &everyone,
            ),
            EventDefinition::new(
                EventType::AppointmentCancelled,
                C::Calendar,
                P::High,
                "Appointment cancelled",
                "{customer_name} cancelled the appointment at {appointment_time}",
                "/calendar/{appointment_id}",
                "appointment",
                &everyone,
            ),
            EventDefinition::new(
                EventType::DocumentUploaded,
                C::Documents,
                P::Low,
                "Document uploaded",
                "{username} uploaded {document_name}",
                "/documents/{document_id}",
                "document",
                &management,
            ),
            EventDefinition::new(
                EventType::InvoicePaid,
                C::Finance,
                P::Medium,
                "Invoice paid",
                "Invoice {invoice_number} for {amount} has been paid",
                "/finance/{invoice_id}",
                "invoice",
                &management,
            ),
            EventDefinition::new(
                EventType::SystemMaintenance,
                C::System,
                P::Urgent,
                "Scheduled maintenance",
                "{message}",
                "/settings",
                "system",
                &everyone,
            ),
        ])
    }

    /// Look up the definition for an event type.
    pub fn lookup(&self, event_type: EventType) -> Option<&EventDefinition> {
        self.definitions.get(&event_type)
    }

    /// Look up a definition by its string key; unknown keys yield `None`.
    pub fn lookup_str(&self, event_type: &str) -> Option<&EventDefinition> {
        event_type
            .parse::<EventType>()
            .ok()
            .and_then(|t| self.lookup(t))
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
