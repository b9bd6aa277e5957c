use assert_matches::assert_matches;
use std::time::Duration;

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_database::{AppointmentStore, StoreError, SupabaseAppointmentStore};
use shared_models::{MarkOutcome, RequestStatus};
use shared_utils::test_utils::{at, MockSupabaseResponses, TestConfig, TestPatient};

#[tokio::test]
async fn test_pending_requests_filters_and_orders() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let patient = TestPatient::default();
    let request = patient.request("69", 1001, "2024-03-01 09:00:00", "2024-03-01 10:00:00");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointment_requests"))
        .and(query_param("status", "eq.pending"))
        .and(query_param("order", "created_at.asc"))
        .and(header("apikey", "test-service-key"))
        .and(header("Authorization", "Bearer test-service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::request_row(&request)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = SupabaseAppointmentStore::new(&config).unwrap();
    let pending = store.pending_requests().await.unwrap();

    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, request.id);
    assert_eq!(pending[0].start_time, at("2024-03-01 09:00:00"));
    assert_eq!(pending[0].status, RequestStatus::Pending);
}

#[tokio::test]
async fn test_mark_fulfilled_is_conditional_patch() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let request_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointment_requests"))
        .and(query_param("id", format!("eq.{}", request_id)))
        .and(query_param("status", "eq.pending"))
        .and(header("Prefer", "return=representation"))
        .and(body_partial_json(json!({ "status": "fulfilled" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": request_id, "status": "fulfilled" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = SupabaseAppointmentStore::new(&config).unwrap();
    let outcome = store.mark_fulfilled(request_id).await.unwrap();

    assert_eq!(outcome, MarkOutcome::Transitioned);
}

#[tokio::test]
async fn test_mark_fulfilled_reports_lost_race() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let request_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointment_requests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointment_requests"))
        .and(query_param("id", format!("eq.{}", request_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": request_id }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = SupabaseAppointmentStore::new(&config).unwrap();
    let outcome = store.mark_fulfilled(request_id).await.unwrap();

    assert_eq!(outcome, MarkOutcome::AlreadyTransitioned);
}

#[tokio::test]
async fn test_mark_fulfilled_missing_request() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let request_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let store = SupabaseAppointmentStore::new(&config).unwrap();
    let result = store.mark_fulfilled(request_id).await;

    assert_matches!(result, Err(StoreError::RequestNotFound(id)) if id == request_id);
}

#[tokio::test]
async fn test_user_contact() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let patient = TestPatient::default();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", patient.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_row(&patient)
        ])))
        .mount(&mock_server)
        .await;

    let store = SupabaseAppointmentStore::new(&config).unwrap();
    let contact = store.user_contact(patient.id).await.unwrap();

    assert_eq!(contact, patient.to_contact());
}

#[tokio::test]
async fn test_unknown_user() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();
    let user_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let store = SupabaseAppointmentStore::new(&config).unwrap();

    assert_matches!(store.user_contact(user_id).await, Err(StoreError::UserNotFound(id)) if id == user_id);
}

#[tokio::test]
async fn test_backend_failure_is_surfaced() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let store = SupabaseAppointmentStore::new(&config).unwrap();
    let result = store.pending_requests().await;

    assert_matches!(result, Err(StoreError::Backend(msg)) if msg.contains("500"));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_mock_server(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let store = SupabaseAppointmentStore::new(&config).unwrap();
    let started = std::time::Instant::now();
    let result = store.pending_requests().await;

    assert_matches!(result, Err(StoreError::Backend(_)));
    assert!(started.elapsed() < Duration::from_secs(3));
}
