//! Named rooms and membership.

pub mod kind;
pub mod membership;
pub mod registry;

pub use kind::{RoomKind, personal_room, role_rooms};
pub use registry::RoomRegistry;
