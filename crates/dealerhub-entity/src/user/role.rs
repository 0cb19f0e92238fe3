//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Staff roles of a dealership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full system administrator.
    Admin,
    /// Dealership manager.
    Manager,
    /// Sales staff.
    Salesperson,
    /// Workshop technician.
    Technician,
    /// Front desk.
    Receptionist,
}

impl UserRole {
    /// Every role, in privilege order.
    pub const ALL: [UserRole; 5] = [
        Self::Admin,
        Self::Manager,
        Self::Salesperson,
        Self::Technician,
        Self::Receptionist,
    ];

    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Check if this role belongs to management (admin or manager).
    pub fn is_management(&self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Salesperson => "salesperson",
            Self::Technician => "technician",
            Self::Receptionist => "receptionist",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = dealerhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "salesperson" => Ok(Self::Salesperson),
            "technician" => Ok(Self::Technician),
            "receptionist" => Ok(Self::Receptionist),
            _ => Err(dealerhub_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: admin, manager, salesperson, technician, receptionist"
            ))),
        }
    }
}
