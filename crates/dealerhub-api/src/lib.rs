//! # dealerhub-api
//!
//! HTTP API layer for DealerHub built on Axum.
//!
//! Provides device and push-subscription registration, the pending
//! notification endpoints used by polling clients, the realtime WebSocket
//! upgrade, access-token validation, and error mapping.

pub mod app;
pub mod auth;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::{AppState, Stores};
