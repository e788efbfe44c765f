//! Integration tests for the HTTP API
//!
//! These drive the full router with `tower::ServiceExt::oneshot`. They need
//! a reachable PostgreSQL with the `fruit` table (`CREATE TABLE fruit
//! (id SERIAL, name TEXT);`) and are `#[ignore]`d so the default test run
//! stays hermetic. Run them with `cargo test -- --ignored`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use orchard::{build_router, Db, ServerConfig, ServerState};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

async fn test_router() -> axum::Router {
    let config = ServerConfig::default();
    let db = Db::connect(&config.database)
        .await
        .expect("requires a running PostgreSQL");
    build_router(Arc::new(ServerState::new(config, db)))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// A name no earlier test run has inserted
fn unique_name(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{prefix}-{nanos}")
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL with the fruit table"]
async fn create_then_list_then_get_round_trip() {
    let router = test_router().await;
    let name = unique_name("durian");

    // Create
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/fruits")
                .body(Body::from(name.clone()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");

    // List and find exactly one record with that name
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/fruits")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listing: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    let matches: Vec<&serde_json::Value> = listing["fruits"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|f| f["name"] == name.as_str())
        .collect();
    assert_eq!(matches.len(), 1);
    let id = matches[0]["id"].as_i64().unwrap();
    assert!(id > 0);

    // Retrieve by the id the listing reported
    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/fruits/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fruit: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(fruit["id"].as_i64().unwrap(), id);
    assert_eq!(fruit["name"], name.as_str());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL with the fruit table"]
async fn get_unknown_id_is_a_server_error() {
    let router = test_router().await;

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/fruits/2147480000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    // Absence of a row surfaces as a backend failure, not a client error
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body_string(response).await.is_empty());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL with the fruit table"]
async fn non_numeric_id_is_rejected_before_storage() {
    let router = test_router().await;

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/fruits/abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "non numeric id");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL with the fruit table"]
async fn sleep_within_budget_completes() {
    let router = test_router().await;

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/sleep?d=3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL with the fruit table"]
async fn sleep_past_budget_is_canceled() {
    let router = test_router().await;

    let start = Instant::now();
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/sleep?d=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    // The 5 s budget cancels the statement well before the 10 s elapse
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(start.elapsed() < Duration::from_secs(8));
    assert!(!body_string(response).await.is_empty());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL with the fruit table"]
async fn non_numeric_sleep_duration_is_rejected() {
    let router = test_router().await;

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/sleep?d=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "non numeric duration");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL with the fruit table"]
async fn home_is_unimplemented_for_every_method() {
    let router = test_router().await;

    for method in ["GET", "POST", "PUT", "DELETE"] {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "not implemented");
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL with the fruit table"]
async fn health_reports_healthy() {
    let router = test_router().await;

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL with the fruit table"]
async fn unmatched_paths_fall_through_to_404() {
    let router = test_router().await;

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v2/fruits")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
