//! HTTP transport for the balance service.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `POST /user/balance`: body `{"user_id": 7, "amount": 100}`. Answers
//!   `200 {"success": true}` or `{"error": "..."}` with 400 (malformed body
//!   or insufficient funds), 404 (unknown account), 422 (invalid id or
//!   amount), 503 (store unavailable) or 500 (internal error).
//! - `GET /health`: `{"ok": true, "cached_accounts": <n>}`.

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{BalanceResponse, BalanceService, DecreaseBalance};
use crate::store::AccountStore;

/// Build an axum `Router` serving the balance service.
pub fn router<S: AccountStore + 'static>(service: Arc<BalanceService<S>>) -> Router {
    Router::new()
        .route("/health", get(health_handler::<S>))
        .route("/user/balance", post(balance_handler::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Serve on `listener` until `shutdown` resolves, then wait for in-flight
/// requests to finish.
pub async fn serve<S, F>(
    service: Arc<BalanceService<S>>,
    listener: TcpListener,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    S: AccountStore + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health_handler<S: AccountStore + 'static>(
    State(service): State<Arc<BalanceService<S>>>,
) -> impl IntoResponse {
    Json(json!({ "ok": true, "cached_accounts": service.cache().len() }))
}

async fn balance_handler<S: AccountStore + 'static>(
    State(service): State<Arc<BalanceService<S>>>,
    body: Bytes,
) -> Response {
    let response = match serde_json::from_slice::<DecreaseBalance>(&body) {
        Ok(request) => BalanceResponse::from(service.apply(request).await),
        Err(err) => BalanceResponse::bad_request(err.to_string()),
    };
    into_http(response)
}

fn into_http(response: BalanceResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body)).into_response()
}
