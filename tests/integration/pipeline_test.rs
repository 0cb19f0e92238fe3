//! Integration tests for the trigger pipeline as seen through the API.

use http::StatusCode;
use serde_json::json;

use dealerhub_entity::user::UserRole;

use crate::helpers::{TestApp, subscription_body};

fn sale() -> serde_json::Value {
    json!({
        "username": "bob",
        "registration": "XY99ABC",
        "sale_price": 15000,
        "vehicle_id": 12
    })
}

#[tokio::test]
async fn test_sale_is_pushed_and_offered_to_pollers() {
    let app = TestApp::new();
    let (bob, _) = app.user("bob", UserRole::Salesperson);
    let (_, mia_token) = app.user("mia", UserRole::Manager);
    let (_, sam_token) = app.user("sam", UserRole::Salesperson);
    app.user("tom", UserRole::Technician);

    let mia_endpoint = "https://fcm.googleapis.com/fcm/send/mia";
    let subscribed = app
        .request(
            "POST",
            "/api/push/subscriptions",
            Some(&mia_token),
            Some(subscription_body(mia_endpoint)),
        )
        .await;
    assert_eq!(subscribed.status, StatusCode::CREATED);

    let report = app.state.trigger.trigger("vehicle.sold", sale(), bob).await;
    assert_eq!(report.records_written(), 2);
    assert_eq!(app.transport.endpoints(), vec![mia_endpoint.to_string()]);

    // Push succeeded for mia, so nothing is left to poll.
    let mia_pending = app
        .request("GET", "/api/notifications/pending", Some(&mia_token), None)
        .await;
    assert_eq!(mia_pending.status, StatusCode::OK);
    assert!(mia_pending.body["data"].as_array().unwrap().is_empty());

    // sam has no subscription and picks the record up by polling.
    let sam_pending = app
        .request("GET", "/api/notifications/pending", Some(&sam_token), None)
        .await;
    let records = sam_pending.body["data"].as_array().unwrap().clone();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["title"], "Vehicle sold");
    assert_eq!(records[0]["message"], "bob sold 'XY99ABC' for 15000");
    assert_eq!(records[0]["action_url"], "/sales/12");

    let id = records[0]["id"].as_str().unwrap();
    let confirmed = app
        .request(
            "PUT",
            &format!("/api/notifications/{id}/delivered"),
            Some(&sam_token),
            None,
        )
        .await;
    assert_eq!(confirmed.status, StatusCode::OK);

    let after = app
        .request("GET", "/api/notifications/pending", Some(&sam_token), None)
        .await;
    assert!(after.body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cannot_confirm_someone_elses_notification() {
    let app = TestApp::new();
    let (bob, _) = app.user("bob", UserRole::Salesperson);
    let (_, sam_token) = app.user("sam", UserRole::Salesperson);
    let (_, mia_token) = app.user("mia", UserRole::Manager);

    app.state.trigger.trigger("vehicle.sold", sale(), bob).await;

    let sam_pending = app
        .request("GET", "/api/notifications/pending", Some(&sam_token), None)
        .await;
    let id = sam_pending.body["data"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "PUT",
            &format!("/api/notifications/{id}/delivered"),
            Some(&mia_token),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_gone_subscription_is_not_pushed_again() {
    let app = TestApp::new();
    let (bob, _) = app.user("bob", UserRole::Salesperson);
    let (_, mia_token) = app.user("mia", UserRole::Manager);
    app.request(
        "POST",
        "/api/push/subscriptions",
        Some(&mia_token),
        Some(subscription_body("https://fcm.googleapis.com/fcm/send/stale")),
    )
    .await;

    app.transport.answer_with(410);
    let first = app.state.trigger.trigger("vehicle.sold", sale(), bob).await;
    assert_eq!(first.push_attempts(), 1);
    assert!(first.recipients.iter().all(|r| !r.delivered));

    app.transport.answer_with(201);
    let second = app.state.trigger.trigger("vehicle.sold", sale(), bob).await;
    assert_eq!(second.push_attempts(), 0);
    assert_eq!(app.transport.endpoints().len(), 1);

    // Both records wait for the poller.
    let pending = app
        .request("GET", "/api/notifications/pending", Some(&mia_token), None)
        .await;
    assert_eq!(pending.body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_event_writes_nothing() {
    let app = TestApp::new();
    let (bob, _) = app.user("bob", UserRole::Admin);
    let (_, mia_token) = app.user("mia", UserRole::Manager);

    let report = app
        .state
        .trigger
        .trigger("vehicle.teleported", json!({}), bob)
        .await;
    assert_eq!(report.records_written(), 0);

    let pending = app
        .request("GET", "/api/notifications/pending", Some(&mia_token), None)
        .await;
    assert!(pending.body["data"].as_array().unwrap().is_empty());
}
