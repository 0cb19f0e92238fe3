//! Message validation rules.

use dealerhub_core::error::AppError;

/// Maximum allowed message size in bytes.
const MAX_MESSAGE_SIZE: usize = 65_536;

/// Maximum room name length.
const MAX_ROOM_NAME_LEN: usize = 128;

/// Validates a raw inbound frame.
pub fn validate_inbound(raw: &str) -> Result<(), AppError> {
    if raw.len() > MAX_MESSAGE_SIZE {
        return Err(AppError::validation(format!(
            "Message exceeds maximum size of {MAX_MESSAGE_SIZE} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty message"));
    }

    Ok(())
}

/// Validates room name format.
pub fn validate_room_name(room: &str) -> Result<(), AppError> {
    if room.is_empty() || room.len() > MAX_ROOM_NAME_LEN {
        return Err(AppError::validation("Invalid room name length"));
    }

    if !room
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ':' || c == '-' || c == '_')
    {
        return Err(AppError::validation("Room name contains invalid characters"));
    }

    Ok(())
}
