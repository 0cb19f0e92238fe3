//! Push subscription handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::request::{RegisterSubscriptionRequest, UnsubscribeRequest, validate};
use crate::dto::response::{ApiResponse, MessageResponse, VapidKeyResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/push/subscriptions
pub async fn subscribe(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<RegisterSubscriptionRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    validate(&req)?;
    let subscription = state
        .devices
        .register_subscription(req.into_subscription(auth.user_id))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "data": {
                "id": subscription.id,
                "endpoint": subscription.endpoint,
                "is_active": subscription.is_active,
            }
        })),
    ))
}

/// DELETE /api/push/subscriptions
pub async fn unsubscribe(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UnsubscribeRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    validate(&req)?;
    state
        .devices
        .unregister_subscription(auth.user_id, &req.endpoint)
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Subscription removed".to_string(),
    })))
}

/// GET /api/push/vapid-public-key
pub async fn vapid_public_key(State(state): State<AppState>) -> Json<ApiResponse<VapidKeyResponse>> {
    Json(ApiResponse::ok(VapidKeyResponse {
        public_key: state.devices.vapid_public_key().to_string(),
    }))
}
