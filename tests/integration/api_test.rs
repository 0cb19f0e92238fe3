//! Integration tests for the device, push, and polling endpoints.

use http::StatusCode;
use serde_json::json;

use dealerhub_entity::user::UserRole;

use crate::helpers::{TestApp, subscription_body};

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["ws_connections"], 0);
}

#[tokio::test]
async fn test_vapid_public_key_is_public() {
    let app = TestApp::new();

    let response = app
        .request("GET", "/api/push/vapid-public-key", None, None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["data"]["public_key"],
        app.state.devices.vapid_public_key()
    );
}

#[tokio::test]
async fn test_requires_access_token() {
    let app = TestApp::new();

    let missing = app
        .request("GET", "/api/notifications/pending", None, None)
        .await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["success"], false);

    let forged = app
        .request("GET", "/api/notifications/pending", Some("not.a.jwt"), None)
        .await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_and_list_devices() {
    let app = TestApp::new();
    let (_, token) = app.user("sam", UserRole::Salesperson);

    let response = app
        .request(
            "POST",
            "/api/devices",
            Some(&token),
            Some(json!({
                "device_token": "install-1",
                "platform": "web",
                "capabilities": {"push": true},
                "app_version": "2.4.0"
            })),
        )
        .await;
    assert!(response.status.is_success(), "got {}", response.status);

    let listed = app.request("GET", "/api/devices", Some(&token), None).await;
    assert_eq!(listed.status, StatusCode::OK);
    let devices = listed.body["data"].as_array().unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0]["device_token"], "install-1");
    assert_eq!(devices[0]["platform"], "web");
}

#[tokio::test]
async fn test_register_device_rejects_empty_token() {
    let app = TestApp::new();
    let (_, token) = app.user("sam", UserRole::Salesperson);

    let response = app
        .request(
            "POST",
            "/api/devices",
            Some(&token),
            Some(json!({"device_token": "", "platform": "android"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_subscription_lifecycle() {
    let app = TestApp::new();
    let (_, token) = app.user("mia", UserRole::Manager);
    let endpoint = "https://fcm.googleapis.com/fcm/send/mia-laptop";

    let created = app
        .request(
            "POST",
            "/api/push/subscriptions",
            Some(&token),
            Some(subscription_body(endpoint)),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["data"]["endpoint"], endpoint);
    assert_eq!(created.body["data"]["is_active"], true);

    let removed = app
        .request(
            "DELETE",
            "/api/push/subscriptions",
            Some(&token),
            Some(json!({"endpoint": endpoint})),
        )
        .await;
    assert_eq!(removed.status, StatusCode::OK);

    let again = app
        .request(
            "DELETE",
            "/api/push/subscriptions",
            Some(&token),
            Some(json!({"endpoint": "https://fcm.googleapis.com/fcm/send/unknown"})),
        )
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_subscription_requires_https_endpoint() {
    let app = TestApp::new();
    let (_, token) = app.user("mia", UserRole::Manager);

    let response = app
        .request(
            "POST",
            "/api/push/subscriptions",
            Some(&token),
            Some(subscription_body("http://push.example/plain")),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ws_requires_upgrade() {
    let app = TestApp::new();

    let response = app.request("GET", "/ws", None, None).await;

    assert!(
        response.status.is_client_error(),
        "Expected a 4xx, got {}",
        response.status
    );
}
