//! Pending-notification handlers for polling clients.

use axum::Json;
use axum::extract::{Path, State};

use dealerhub_core::types::NotificationId;

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/notifications/pending
pub async fn pending(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let notifications = state.notifications.pending(auth.user_id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": notifications })))
}

/// PUT /api/notifications/{id}/delivered
pub async fn mark_delivered(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .notifications
        .confirm_delivered(auth.user_id, id)
        .await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": { "message": "Marked as delivered" } }),
    ))
}
