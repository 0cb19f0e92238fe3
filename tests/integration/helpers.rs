//! Shared test helpers for integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use chrono::{Duration, Utc};
use http::{Request, StatusCode};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use tower::ServiceExt;

use dealerhub_api::auth::Claims;
use dealerhub_api::{AppState, Stores};
use dealerhub_core::config::AppConfig;
use dealerhub_core::types::UserId;
use dealerhub_database::memory::MemoryDirectory;
use dealerhub_entity::user::UserRole;
use dealerhub_service::push::{PushFailure, PushRequest, PushResponse, PushTransport, VapidSigner};

pub const JWT_SECRET: &str = "integration-secret";

/// Push transport that records requests and answers with a fixed status.
pub struct RecordingTransport {
    pub status: Mutex<u16>,
    pub requests: Mutex<Vec<PushRequest>>,
}

impl RecordingTransport {
    fn new() -> Self {
        Self {
            status: Mutex::new(201),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn answer_with(&self, status: u16) {
        *self.status.lock().unwrap() = status;
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.endpoint.clone())
            .collect()
    }
}

#[async_trait]
impl PushTransport for RecordingTransport {
    async fn send(&self, request: PushRequest) -> Result<PushResponse, PushFailure> {
        self.requests.lock().unwrap().push(request);
        Ok(PushResponse {
            status: *self.status.lock().unwrap(),
            retry_after: None,
            body: String::new(),
        })
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for driving the pipeline directly
    pub state: AppState,
    /// Users, permissions, and preferences
    pub directory: Arc<MemoryDirectory>,
    /// Outgoing push requests
    pub transport: Arc<RecordingTransport>,
}

/// Test response wrapper
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    /// Create a new test application over in-memory stores
    pub fn new() -> Self {
        let mut config = AppConfig::from_toml("").expect("Failed to build test config");
        config.auth.jwt_secret = JWT_SECRET.to_string();
        config.realtime.auth_timeout_seconds = 5;

        let directory = Arc::new(MemoryDirectory::new());
        let transport = Arc::new(RecordingTransport::new());
        let state = AppState::new(
            config,
            Stores::memory(directory.clone()),
            transport.clone(),
            VapidSigner::generate("mailto:ops@dealer.example").unwrap(),
        );

        Self {
            router: dealerhub_api::build_app(state.clone()),
            state,
            directory,
            transport,
        }
    }

    /// Add a user and return their ID and an access token
    pub fn user(&self, username: &str, role: UserRole) -> (UserId, String) {
        let id = self.directory.add_user(username, role);
        (id, token_for(id, username, role))
    }

    /// Make a test request
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }

        let body = match body {
            Some(b) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&b).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Sign an access token the way the login service does
pub fn token_for(id: UserId, username: &str, role: UserRole) -> String {
    let claims = Claims {
        sub: id,
        username: username.to_string(),
        role,
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
        iat: Some(Utc::now().timestamp()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// A browser-shaped subscription body with valid key material
pub fn subscription_body(endpoint: &str) -> Value {
    // Any uncompressed P-256 point will do; a fresh VAPID key is one.
    let p256dh = VapidSigner::generate("mailto:keys@dealer.example")
        .unwrap()
        .public_key()
        .to_string();
    serde_json::json!({
        "endpoint": endpoint,
        "keys": {
            "p256dh": p256dh,
            "auth": "AAECAwQFBgcICQoLDA0ODw",
        }
    })
}
