//! Page permission levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Access level a user holds on one back-office page.
///
/// Levels are ordered: `Hidden < View < Edit < Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "permission_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    /// The page is hidden from the user entirely.
    Hidden,
    /// Read-only access.
    View,
    /// Can modify records on the page.
    Edit,
    /// Unrestricted access.
    Full,
}

impl PermissionLevel {
    /// Whether the page is visible at all.
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Hidden)
    }

    /// Return the level as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::View => "view",
            Self::Edit => "edit",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
