//! Notification category enumeration.

use serde::{Deserialize, Serialize};

/// Category of a notification for filtering and preference matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    /// Stock changes.
    Inventory,
    /// Sales and reservations.
    Sales,
    /// Customer records.
    Customers,
    /// CRM leads.
    Leads,
    /// Workshop jobs.
    Workshop,
    /// Appointments.
    Calendar,
    /// Uploaded documents.
    Documents,
    /// Invoices and payments.
    Finance,
    /// System announcements.
    System,
}

impl NotificationCategory {
    /// Return the category as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Sales => "sales",
            Self::Customers => "customers",
            Self::Leads => "leads",
            Self::Workshop => "workshop",
            Self::Calendar => "calendar",
            Self::Documents => "documents",
            Self::Finance => "finance",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
