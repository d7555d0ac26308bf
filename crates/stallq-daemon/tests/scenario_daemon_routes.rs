//! In-process scenario tests for stallq-daemon HTTP endpoints.
//!
//! These tests spin up the Axum router **without** binding a TCP socket.
//! Each test calls `routes::build_router` and drives it via
//! `tower::ServiceExt::oneshot`, no network I/O required.
//!
//! The pool is created lazily and never connects: every request below is
//! refused (or answered) before the handler touches the database.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use stallq_config::OrderPolicy;
use stallq_daemon::{routes, state};
use tower::ServiceExt; // oneshot

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a fresh in-process router over a pool that never connects.
fn make_router() -> axum::Router {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy("postgres://stallq@127.0.0.1:1/unreachable")
        .expect("lazy pool");
    let st = Arc::new(state::AppState::new(
        pool,
        OrderPolicy::default(),
        "test-config-hash".to_string(),
    ));
    routes::build_router(st)
}

/// Drive the router with a single request and return (status, body_bytes).
async fn call(router: axum::Router, req: Request<axum::body::Body>) -> (StatusCode, bytes::Bytes) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

/// Parse body bytes as a `serde_json::Value`.
fn parse_json(b: bytes::Bytes) -> serde_json::Value {
    serde_json::from_slice(&b).expect("body is not valid JSON")
}

fn post_json(uri: &str, who: Option<(&str, &str)>, body: serde_json::Value) -> Request<axum::body::Body> {
    let mut b = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some((id, role)) = who {
        b = b.header("x-user-id", id).header("x-user-role", role);
    }
    b.body(axum::body::Body::from(body.to_string())).unwrap()
}

fn get_as(uri: &str, id: &str, role: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-user-id", id)
        .header("x-user-role", role)
        .body(axum::body::Body::empty())
        .unwrap()
}

fn assert_error_body(json: &serde_json::Value, kind: &str) {
    assert_eq!(json["success"], false, "body: {json}");
    assert_eq!(json["error"], kind, "body: {json}");
    assert!(json["message"].as_str().is_some_and(|m| !m.is_empty()));
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_ok_true() {
    let router = make_router();
    let req = Request::builder()
        .method("GET")
        .uri("/v1/health")
        .body(axum::body::Body::empty())
        .unwrap();

    let (status, body) = call(router, req).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "stallq-daemon");
    assert_eq!(json["config_hash"], "test-config-hash");
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn place_order_without_identity_is_401() {
    let req = post_json(
        "/v1/orders",
        None,
        serde_json::json!({"product_id": 1, "quantity": 1}),
    );
    let (status, body) = call(make_router(), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error_body(&parse_json(body), "unauthenticated");
}

#[tokio::test]
async fn malformed_identity_is_401() {
    for (id, role) in [("abc", "customer"), ("0", "customer"), ("5", "admin")] {
        let req = post_json(
            "/v1/orders",
            Some((id, role)),
            serde_json::json!({"product_id": 1, "quantity": 1}),
        );
        let (status, body) = call(make_router(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "id={id} role={role}");
        assert_error_body(&parse_json(body), "unauthenticated");
    }
}

// ---------------------------------------------------------------------------
// POST /v1/orders
// ---------------------------------------------------------------------------

#[tokio::test]
async fn owner_cannot_place_orders_403() {
    let req = post_json(
        "/v1/orders",
        Some(("3", "owner")),
        serde_json::json!({"product_id": 1, "quantity": 1}),
    );
    let (status, body) = call(make_router(), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error_body(&parse_json(body), "unauthorized");
}

#[tokio::test]
async fn non_positive_or_oversized_quantity_is_400() {
    let max = OrderPolicy::default().max_quantity_per_order;
    for qty in [0, -1, max + 1] {
        let req = post_json(
            "/v1/orders",
            Some(("7", "customer")),
            serde_json::json!({"product_id": 1, "quantity": qty}),
        );
        let (status, body) = call(make_router(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "quantity {qty}");
        assert_error_body(&parse_json(body), "invalid_request");
    }
}

#[tokio::test]
async fn mistyped_body_field_is_400_with_error_body() {
    let req = post_json(
        "/v1/orders",
        Some(("7", "customer")),
        serde_json::json!({"product_id": 3, "quantity": "two"}),
    );
    let (status, body) = call(make_router(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json = parse_json(body);
    assert_error_body(&json, "invalid_request");
    assert!(json["message"].as_str().unwrap().contains("quantity"), "body: {json}");
}

#[tokio::test]
async fn unparseable_or_untyped_body_is_400() {
    let broken = Request::builder()
        .method("POST")
        .uri("/v1/orders")
        .header("content-type", "application/json")
        .header("x-user-id", "7")
        .header("x-user-role", "customer")
        .body(axum::body::Body::from("{\"product_id\": 3,"))
        .unwrap();
    let (status, body) = call(make_router(), broken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_body(&parse_json(body), "invalid_request");

    let no_content_type = Request::builder()
        .method("POST")
        .uri("/v1/orders")
        .header("x-user-id", "7")
        .header("x-user-role", "customer")
        .body(axum::body::Body::from(r#"{"product_id": 3, "quantity": 1}"#))
        .unwrap();
    let (status, body) = call(make_router(), no_content_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_body(&parse_json(body), "invalid_request");
}

#[tokio::test]
async fn non_numeric_path_id_is_400_with_error_body() {
    let req = post_json("/v1/orders/abc/cancel", Some(("7", "customer")), serde_json::json!({}));
    let (status, body) = call(make_router(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_body(&parse_json(body), "invalid_request");

    let req = Request::builder()
        .method("GET")
        .uri("/v1/stalls/tacos/products")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = call(make_router(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_body(&parse_json(body), "invalid_request");
}

// ---------------------------------------------------------------------------
// POST /v1/orders/:order_id/status  and  /cancel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_target_status_is_400() {
    let req = post_json(
        "/v1/orders/11/status",
        Some(("3", "owner")),
        serde_json::json!({"status": "served"}),
    );
    let (status, body) = call(make_router(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_body(&parse_json(body), "invalid_request");
}

#[tokio::test]
async fn customer_cannot_change_status_403() {
    let req = post_json(
        "/v1/orders/11/status",
        Some(("7", "customer")),
        serde_json::json!({"status": "accepted"}),
    );
    let (status, body) = call(make_router(), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error_body(&parse_json(body), "unauthorized");
}

#[tokio::test]
async fn owner_cannot_cancel_403() {
    let req = post_json("/v1/orders/11/cancel", Some(("3", "owner")), serde_json::json!({}));
    let (status, body) = call(make_router(), req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error_body(&parse_json(body), "unauthorized");
}

// ---------------------------------------------------------------------------
// Queue views
// ---------------------------------------------------------------------------

#[tokio::test]
async fn queue_views_are_role_scoped() {
    let (status, body) = call(make_router(), get_as("/v1/owner/orders", "7", "customer")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error_body(&parse_json(body), "unauthorized");

    let (status, _) = call(make_router(), get_as("/v1/owner/products", "7", "customer")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(make_router(), get_as("/v1/customer/orders", "3", "owner")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (status, _) = call(make_router(), get_as("/v1/nope", "1", "owner")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
