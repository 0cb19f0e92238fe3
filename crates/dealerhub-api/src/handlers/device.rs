//! Device registration handlers.

use axum::Json;
use axum::extract::State;

use dealerhub_entity::device::DeviceRegistration;

use crate::dto::request::{RegisterDeviceRequest, validate};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/devices
pub async fn register_device(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<RegisterDeviceRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate(&req)?;
    let device = state
        .devices
        .register_device(req.into_registration(auth.user_id, auth.user_agent))
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": device })))
}

/// GET /api/devices
pub async fn list_devices(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<DeviceRegistration>>>, ApiError> {
    let devices = state.devices.devices(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(devices)))
}
