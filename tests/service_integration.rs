use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use prodamus_gateway::{
    config::Environment, provider::client::ProdamusClient, router::create_router,
    state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let client = ProdamusClient::new(Duration::from_secs(5), "http").unwrap();
    create_router(AppState::new(client, Environment::Production))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn root_lists_endpoints() {
    let (status, body) = send(app(), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("running"));
    assert_eq!(
        body["endpoints"]["setActivity"],
        json!({
            "method": "POST",
            "path": "/setActivity",
            "description": "Activate or deactivate subscription"
        })
    );
    assert!(body["endpoints"]["setSubscriptionDiscount"].is_object());
    assert!(body["endpoints"]["setSubscriptionPaymentDate"].is_object());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn health_reports_uptime() {
    let (status, body) = send(app(), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert!(body["uptime"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn unknown_route_returns_404_envelope() {
    let request = Request::builder()
        .method("POST")
        .uri("/unknown")
        .header("Content-Type", "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Route not found"));
    assert_eq!(body["message"], json!("Cannot POST /unknown"));
    assert_eq!(
        body["availableEndpoints"]["setSubscriptionDiscount"],
        json!("POST /setSubscriptionDiscount")
    );
}

#[tokio::test]
async fn malformed_json_returns_400_envelope() {
    let request = Request::builder()
        .method("POST")
        .uri("/setActivity")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
}

#[tokio::test]
async fn wrong_field_type_returns_400_envelope() {
    let request = Request::builder()
        .method("POST")
        .uri("/setActivity")
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"isActive": "yes"}"#))
        .unwrap();

    let (status, _) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let response = app().oneshot(get("/health")).await.unwrap();
    let headers = response.headers();

    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["referrer-policy"], "no-referrer");
}
