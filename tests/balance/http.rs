//! HTTP transport integration tests.
//!
//! Starts the axum router on an ephemeral port and exercises it with reqwest.

use serde_json::{json, Value};
use tokio::sync::oneshot;

use balance_cache::service;

use crate::support::Harness;

/// Bind to port 0 and return the base URL plus a shutdown trigger.
async fn start_server(h: &Harness) -> (String, oneshot::Sender<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let balance = h.service.clone();
    tokio::spawn(async move {
        service::serve(balance, listener, async {
            let _ = stop_rx.await;
        })
        .await
        .unwrap();
    });
    (format!("http://{addr}"), stop_tx)
}

async fn post_balance(base: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{base}/user/balance"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn health_check() {
    let h = Harness::new(&[(7, 10_000)]);
    let (base, _stop) = start_server(&h).await;

    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["cached_accounts"], 0);
}

#[tokio::test]
async fn decrease_then_overdraw() {
    let h = Harness::new(&[(7, 10_000)]);
    let (base, _stop) = start_server(&h).await;

    let (status, body) = post_balance(&base, json!({ "user_id": 7, "amount": 4000 })).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "success": true }));

    let (status, body) = post_balance(&base, json!({ "user_id": 7, "amount": 7000 })).await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "not enough money" }));

    assert_eq!(h.balance(7), 6_000);
}

#[tokio::test]
async fn unknown_user_is_404() {
    let h = Harness::new(&[(7, 10_000)]);
    let (base, _stop) = start_server(&h).await;

    let (status, body) = post_balance(&base, json!({ "user_id": 999, "amount": 1 })).await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({ "error": "user not found" }));
}

#[tokio::test]
async fn invalid_values_are_422() {
    let h = Harness::new(&[(7, 10_000)]);
    let (base, _stop) = start_server(&h).await;

    let (status, body) = post_balance(&base, json!({ "user_id": 0, "amount": 5 })).await;
    assert_eq!(status, 422);
    assert_eq!(body, json!({ "error": "invalid user id" }));

    let (status, body) = post_balance(&base, json!({ "user_id": 7, "amount": 0 })).await;
    assert_eq!(status, 422);
    assert_eq!(body, json!({ "error": "invalid amount" }));
}

#[tokio::test]
async fn malformed_body_is_400() {
    let h = Harness::new(&[(7, 10_000)]);
    let (base, _stop) = start_server(&h).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/user/balance"))
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn store_outage_is_503() {
    let h = Harness::new(&[(7, 10_000)]);
    h.store.set_fail_reads(true);
    let (base, _stop) = start_server(&h).await;

    let (status, body) = post_balance(&base, json!({ "user_id": 7, "amount": 1 })).await;
    assert_eq!(status, 503);
    assert!(body["error"].as_str().unwrap().starts_with("store unavailable"));
}

#[tokio::test]
async fn graceful_shutdown_stops_accepting() {
    let h = Harness::new(&[(7, 10_000)]);
    let (base, stop) = start_server(&h).await;

    let (status, _) = post_balance(&base, json!({ "user_id": 7, "amount": 1 })).await;
    assert_eq!(status, 200);

    stop.send(()).unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let result = reqwest::Client::new()
        .post(format!("{base}/user/balance"))
        .json(&json!({ "user_id": 7, "amount": 1 }))
        .send()
        .await;
    assert!(result.is_err());
    assert_eq!(h.balance(7), 9_999);
}
