//! Room naming and access rules.

use dealerhub_core::types::UserId;
use dealerhub_entity::user::UserRole;

/// Room restricted to admins.
pub const ADMIN_ROOM: &str = "admin";
/// Room restricted to admins and managers.
pub const MANAGEMENT_ROOM: &str = "management";

/// Classification of a room name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomKind {
    /// `user:{id}`, one per user.
    Personal(UserId),
    /// `admin`.
    Admin,
    /// `management`.
    Management,
    /// Any other room (`dashboard`, `sales`, `vehicle:42`, ...).
    Topic,
}

impl RoomKind {
    /// Classify a room name.
    pub fn parse(room: &str) -> Self {
        match room.split_once(':') {
            Some(("user", id)) => match id.parse() {
                Ok(id) => Self::Personal(id),
                Err(_) => Self::Topic,
            },
            _ => match room {
                ADMIN_ROOM => Self::Admin,
                MANAGEMENT_ROOM => Self::Management,
                _ => Self::Topic,
            },
        }
    }

    /// Whether a user with `user_id` and `role` may join this room.
    pub fn permits(&self, user_id: UserId, role: UserRole) -> bool {
        match self {
            Self::Personal(owner) => *owner == user_id,
            Self::Admin => role.is_admin(),
            Self::Management => role.is_management(),
            Self::Topic => true,
        }
    }
}

/// The personal room of a user.
pub fn personal_room(user_id: UserId) -> String {
    format!("user:{user_id}")
}

/// Rooms a role joins on every (re)connect.
pub fn role_rooms(role: UserRole) -> &'static [&'static str] {
    match role {
        UserRole::Admin => &[ADMIN_ROOM, MANAGEMENT_ROOM],
        UserRole::Manager => &[MANAGEMENT_ROOM],
        UserRole::Salesperson => &["sales"],
        UserRole::Technician => &["workshop"],
        UserRole::Receptionist => &["reception"],
    }
}
