mod common;

use axum::{
    Json, Router,
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::{get, put},
};
use common::{closed_url, order_json, spawn_stub};
use order_agent::services::{
    AccessToken, GatewayError, HttpHealthChecker, HttpOrderGateway, OrderGateway, Reachability,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn gateway(base: &str) -> HttpOrderGateway {
    HttpOrderGateway::new(
        format!("{}/api/orders/unprinted/", base),
        format!("{}/api/orders/printed/", base),
        Duration::from_secs(2),
    )
    .unwrap()
}

async fn orders_stub(status: StatusCode, body: Value) -> String {
    let router = Router::new().route(
        "/api/orders/unprinted/",
        get(move |headers: HeaderMap| {
            let body = body.clone();
            async move {
                if bearer(&headers).as_deref() != Some("Bearer tok") {
                    return (StatusCode::UNAUTHORIZED, Json(json!({})));
                }
                (status, Json(body))
            }
        }),
    );
    spawn_stub(router).await
}

#[tokio::test]
async fn test_fetch_pending_with_bearer() {
    let base = orders_stub(StatusCode::OK, json!([order_json(1), order_json(2)])).await;

    let orders = gateway(&base)
        .fetch_pending(&AccessToken::new("tok"))
        .await
        .unwrap();

    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(orders[0].order_products[0].product.product_name, "Picanha");
}

#[tokio::test]
async fn test_fetch_rejects_wrong_token() {
    let base = orders_stub(StatusCode::OK, json!([])).await;
    let err = gateway(&base)
        .fetch_pending(&AccessToken::new("other"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Status { status: 401, .. }));
}

#[tokio::test]
async fn test_fetch_server_error() {
    let base = orders_stub(StatusCode::INTERNAL_SERVER_ERROR, json!({ "detail": "db down" })).await;
    let err = gateway(&base)
        .fetch_pending(&AccessToken::new("tok"))
        .await
        .unwrap_err();

    match err {
        GatewayError::Status { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("db down"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_malformed_payload() {
    let base = orders_stub(StatusCode::OK, json!({ "results": [] })).await;
    let err = gateway(&base)
        .fetch_pending(&AccessToken::new("tok"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Decode(_)));
}

#[tokio::test]
async fn test_fetch_rejects_order_without_products() {
    let mut order = order_json(9);
    order["order_products"] = json!([]);
    let base = orders_stub(StatusCode::OK, json!([order])).await;

    let err = gateway(&base)
        .fetch_pending(&AccessToken::new("tok"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidOrder(_)));
}

#[tokio::test]
async fn test_acknowledge_puts_order_id() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let router = Router::new().route(
        "/api/orders/printed/{id}/",
        put(move |Path(id): Path<i64>, headers: HeaderMap| {
            let recorder = recorder.clone();
            async move {
                recorder.lock().push((id, bearer(&headers)));
                if id == 404 {
                    StatusCode::NOT_FOUND
                } else {
                    StatusCode::OK
                }
            }
        }),
    );
    let base = spawn_stub(router).await;
    let gateway = gateway(&base);
    let token = AccessToken::new("tok");

    gateway.acknowledge(42, &token).await.unwrap();
    let err = gateway.acknowledge(404, &token).await.unwrap_err();
    assert!(matches!(err, GatewayError::Status { status: 404, .. }));

    let seen = seen.lock().clone();
    assert_eq!(
        seen,
        vec![
            (42, Some("Bearer tok".to_string())),
            (404, Some("Bearer tok".to_string())),
        ]
    );
}

#[tokio::test]
async fn test_acknowledge_unreachable() {
    let gateway = gateway(&closed_url().await);
    let err = gateway
        .acknowledge(1, &AccessToken::new("tok"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Http(_)));
}

async fn health_stub(status: StatusCode) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/api/health/",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                status
            }
        }),
    );
    let base = spawn_stub(router).await;
    (format!("{}/api/health/", base), hits)
}

#[tokio::test]
async fn test_probe_ok() {
    let (url, hits) = health_stub(StatusCode::OK).await;
    let checker = HttpHealthChecker::new().unwrap();
    assert!(checker.probe(&url).await);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_probe_retries_non_ok_status() {
    let (url, hits) = health_stub(StatusCode::SERVICE_UNAVAILABLE).await;
    let checker = HttpHealthChecker::new().unwrap();
    assert!(!checker.probe(&url).await);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_probe_unreachable() {
    let url = closed_url().await;
    let checker = HttpHealthChecker::with_settings(3, Duration::from_secs(1)).unwrap();
    assert!(!checker.probe(&url).await);
}
