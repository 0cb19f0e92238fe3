//! Route definitions for the DealerHub HTTP API.
//!
//! REST routes are mounted under `/api`; the realtime socket lives at `/ws`.

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::handlers;
use crate::state::AppState;

/// Build the router with all routes, threading `AppState` through
/// `.with_state(state)`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(device_routes())
        .merge(push_routes())
        .merge(notification_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handlers::ws::ws_upgrade))
        .with_state(state)
}

/// Device registry
fn device_routes() -> Router<AppState> {
    Router::new().route(
        "/devices",
        post(handlers::device::register_device).get(handlers::device::list_devices),
    )
}

/// Web Push subscriptions and the application server key
fn push_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/push/subscriptions",
            post(handlers::push::subscribe).delete(handlers::push::unsubscribe),
        )
        .route(
            "/push/vapid-public-key",
            get(handlers::push::vapid_public_key),
        )
}

/// Polling path for pending notifications
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications/pending",
            get(handlers::notification::pending),
        )
        .route(
            "/notifications/{id}/delivered",
            put(handlers::notification::mark_delivered),
        )
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
