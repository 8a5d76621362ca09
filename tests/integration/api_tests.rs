//! API integration tests against a running server
//!
//! Start the server (with its database and Redis), then:
//! cargo test --test api_tests -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Client keeping cookies between calls, like a browser
fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let response = Client::new()
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_visit_counted_once_per_browser() {
    let client = browser();

    client
        .put(format!("{}/consent", BASE_URL))
        .json(&json!({ "functional": true, "analytics": true, "marketing": false }))
        .send()
        .await
        .expect("Failed to send consent");

    let first: Value = client
        .post(format!("{}/visits/refresh", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let second: Value = client
        .post(format!("{}/visits/refresh", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    assert_eq!(first["monthlyVisitors"], second["monthlyVisitors"]);
    assert_eq!(first["totalVisitors"], second["totalVisitors"]);
    assert_eq!(second["isTracking"], true);
}

#[tokio::test]
#[ignore]
async fn test_popup_shown_once_per_session() {
    let client = browser();

    let first: Value = client
        .get(format!("{}/popups/current", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    if first["is_open"] == true {
        let id = first["current_popup"]["id"].as_str().expect("No popup id");
        let second: Value = client
            .get(format!("{}/popups/current", BASE_URL))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse response");
        assert_ne!(second["current_popup"]["id"].as_str(), Some(id));
    }
}

#[tokio::test]
#[ignore]
async fn test_dashboard_requires_auth() {
    let response = Client::new()
        .get(format!("{}/popups", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}
