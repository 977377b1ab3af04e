//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use nightfall_core::clock::Clock;
use nightfall_roles::application::wake_order_source::YamlWakeOrderSource;
use nightfall_snapshot_store::in_memory::InMemorySnapshotRepository;
use nightfall_test_support::FixedClock;
use tower::ServiceExt;

use nightfall_api::state::{AppState, GameDefaults};

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 10, 18, 21, 0, 0).unwrap(),
    ))
}

/// Fresh state with an in-memory snapshot store and the canonical wake
/// order.
pub fn build_test_state() -> AppState {
    AppState::new(
        fixed_clock(),
        Arc::new(InMemorySnapshotRepository::new()),
        Arc::new(YamlWakeOrderSource::default()),
        GameDefaults {
            variant: "base".to_owned(),
            include_base_roles: true,
        },
    )
}

/// The full app router over `state`. Same route structure as `main.rs`.
pub fn build_test_app(state: &AppState) -> Router {
    nightfall_api::app(state.clone())
}

/// One werewolf and three villagers; 3 and 4 are bonded.
pub fn village_table() -> serde_json::Value {
    serde_json::json!({
        "players": [
            { "id": 1, "display_name": "Ada", "role": "werewolf" },
            { "id": 2, "display_name": "Bo", "role": "villager" },
            { "id": 3, "display_name": "Cy", "role": "villager", "love_partner": 4 },
            { "id": 4, "display_name": "Di", "role": "villager", "love_partner": 3 }
        ]
    })
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
