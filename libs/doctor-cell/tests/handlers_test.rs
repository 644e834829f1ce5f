use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use doctor_cell::router::admin_doctor_routes;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn admin_app() -> Router {
    admin_doctor_routes(Arc::new(TestConfig::default().to_app_config()))
}

#[tokio::test]
async fn test_availability_requires_token() {
    let app = admin_app();

    let request = Request::builder()
        .method("PUT")
        .uri(&format!("/{}/availability", Uuid::new_v4()))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "status": "busy" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_availability_rejects_non_admin() {
    let config = TestConfig::default();
    let patient = TestUser::patient("pat@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, Some(24));
    let app = admin_app();

    let request = Request::builder()
        .method("PUT")
        .uri(&format!("/{}/availability", Uuid::new_v4()))
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "status": "busy" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_toggle_rejects_expired_token() {
    let config = TestConfig::default();
    let admin = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_expired_token(&admin, &config.jwt_secret);
    let app = admin_app();

    let request = Request::builder()
        .method("PUT")
        .uri(&format!("/{}/toggle-status", Uuid::new_v4()))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_toggle_rejects_malformed_token() {
    let app = admin_app();

    let request = Request::builder()
        .method("PUT")
        .uri(&format!("/{}/toggle-status", Uuid::new_v4()))
        .header("authorization", format!("Bearer {}", JwtTestUtils::create_malformed_token()))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
