use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn mock_config(mock_server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: mock_server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
    }
}

fn cancel_request(appointment_id: &Uuid, token: &str) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(&format!("/{}/cancel", appointment_id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_cancel_own_upcoming_appointment() {
    let mock_server = MockServer::start().await;
    let config = mock_config(&mock_server);
    let patient = TestUser::patient("pat@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.supabase_jwt_secret, Some(24));
    let app = appointment_routes(Arc::new(config));

    let appointment_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &patient.id,
                &doctor_id,
                "2025-06-01",
                "10:00 AM",
                "upcoming",
            )
        ])))
        .mount(&mock_server)
        .await;

    // Write is conditioned on a non-terminal status
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .and(query_param("status", "in.(pending,upcoming)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &patient.id,
                &doctor_id,
                "2025-06-01",
                "10:00 AM",
                "canceled",
            )
        ])))
        .mount(&mock_server)
        .await;

    let response = app.oneshot(cancel_request(&appointment_id, &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json_response["success"], true);
    assert_eq!(json_response["appointment"]["status"], "canceled");
}

#[tokio::test]
async fn test_cancel_already_canceled_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = mock_config(&mock_server);
    let patient = TestUser::patient("pat@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.supabase_jwt_secret, Some(24));
    let app = appointment_routes(Arc::new(config));

    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &patient.id,
                &Uuid::new_v4().to_string(),
                "2025-06-01",
                "10:00 AM",
                "canceled",
            )
        ])))
        .mount(&mock_server)
        .await;

    let response = app.oneshot(cancel_request(&appointment_id, &token)).await.unwrap();

    // Cancel is not idempotent: the second attempt is an error, not a no-op
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_foreign_appointment_reads_as_absent() {
    let mock_server = MockServer::start().await;
    let config = mock_config(&mock_server);
    let patient = TestUser::patient("pat@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.supabase_jwt_secret, Some(24));
    let app = appointment_routes(Arc::new(config));

    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                "2025-06-01",
                "10:00 AM",
                "upcoming",
            )
        ])))
        .mount(&mock_server)
        .await;

    let response = app.oneshot(cancel_request(&appointment_id, &token)).await.unwrap();

    // Ownership failures are indistinguishable from a missing row
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_unknown_appointment_is_404() {
    let mock_server = MockServer::start().await;
    let config = mock_config(&mock_server);
    let patient = TestUser::patient("pat@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.supabase_jwt_secret, Some(24));
    let app = appointment_routes(Arc::new(config));

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let response = app
        .oneshot(cancel_request(&Uuid::new_v4(), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_via_delete_verb() {
    let mock_server = MockServer::start().await;
    let config = mock_config(&mock_server);
    let patient = TestUser::patient("pat@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.supabase_jwt_secret, Some(24));
    let app = appointment_routes(Arc::new(config));

    let appointment_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &patient.id,
                &doctor_id,
                "2025-06-01",
                "10:00 AM",
                "upcoming",
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(
                &appointment_id.to_string(),
                &patient.id,
                &doctor_id,
                "2025-06-01",
                "10:00 AM",
                "canceled",
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("DELETE")
        .uri(&format!("/{}/cancel", appointment_id))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_book_requires_token() {
    let app = appointment_routes(Arc::new(TestConfig::default().to_app_config()));

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "doctor_id": Uuid::new_v4(),
                "slot_date": "2025-06-01",
                "slot_time": "10:00 AM"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_rejects_expired_token() {
    let config = TestConfig::default();
    let patient = TestUser::patient("pat@example.com");
    let token = JwtTestUtils::create_expired_token(&patient, &config.jwt_secret);
    let app = appointment_routes(Arc::new(config.to_app_config()));

    let request = Request::builder()
        .method("GET")
        .uri("/mine")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_book_with_missing_fields_is_400() {
    let config = TestConfig::default();
    let patient = TestUser::patient("pat@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, Some(24));
    let app = appointment_routes(Arc::new(config.to_app_config()));

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "doctor_id": Uuid::new_v4() }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json_response["success"], false);
    assert!(json_response["error"]
        .as_str()
        .unwrap()
        .contains("slot_date"));
}

#[tokio::test]
async fn test_book_with_malformed_date_is_400() {
    let config = TestConfig::default();
    let patient = TestUser::patient("pat@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, Some(24));
    let app = appointment_routes(Arc::new(config.to_app_config()));

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "doctor_id": Uuid::new_v4(),
                "slot_date": "06/01/2025",
                "slot_time": "10:00 AM"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_book_with_off_grid_slot_time_is_400() {
    let config = TestConfig::default();
    let patient = TestUser::patient("pat@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, Some(24));
    let app = appointment_routes(Arc::new(config.to_app_config()));

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "doctor_id": Uuid::new_v4(),
                "slot_date": "2025-06-01",
                "slot_time": "10:15 AM"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_with_unknown_status_filter_is_400() {
    let config = TestConfig::default();
    let patient = TestUser::patient("pat@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, Some(24));
    let app = appointment_routes(Arc::new(config.to_app_config()));

    let request = Request::builder()
        .method("GET")
        .uri("/mine?status=archived")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
