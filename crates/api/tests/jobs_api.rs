//! Integration tests for `/start` and `/status`.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, body_text, build_test_app, send_empty, send_json, CONFIRM_TIMEOUT};
use hellosvc_broker::{ConfirmMode, Consumer};
use hellosvc_core::status::JobStatus;
use hellosvc_db::JobStore;

// ---------------------------------------------------------------------------
// Start
// ---------------------------------------------------------------------------

#[tokio::test]
async fn start_returns_new_job_after_confirm() {
    let app = build_test_app(ConfirmMode::Ack);
    let response = send_empty(app.router.clone(), Method::POST, "/start").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "New");
    assert!(json["createdAt"].is_string());

    let id = json["id"].as_str().unwrap().parse().unwrap();
    let stored = app.store.get_job(id).await.unwrap();
    assert_eq!(stored.status, JobStatus::New);

    let mut consumer = app.broker.take_consumer().unwrap();
    let delivery = consumer.recv().await.unwrap().unwrap();
    let queued: serde_json::Value = serde_json::from_slice(delivery.data()).unwrap();
    assert_eq!(queued["id"], json["id"]);
}

#[tokio::test]
async fn start_nacked_is_500_and_row_kept() {
    let app = build_test_app(ConfirmMode::Nack);
    let response = send_empty(app.router.clone(), Method::POST, "/start").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "failed to add job to queue");
    assert_eq!(app.store.job_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn start_without_confirm_times_out_with_500() {
    let app = build_test_app(ConfirmMode::Never);
    let started = tokio::time::Instant::now();

    let response = send_empty(app.router.clone(), Method::POST, "/start").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "failed to add job to queue");
    assert!(started.elapsed() >= CONFIRM_TIMEOUT);
    assert_eq!(app.store.job_count(), 1);
}

#[tokio::test]
async fn start_rejects_get() {
    let app = build_test_app(ConfirmMode::Ack);
    let response = send_empty(app.router.clone(), Method::GET, "/start").await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(app.store.job_count(), 0);
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_returns_stored_job_on_get_and_post() {
    let app = build_test_app(ConfirmMode::Ack);
    let job = app.store.create_job().await.unwrap();
    let body = format!(r#"{{"id":"{}"}}"#, job.id);

    for method in [Method::GET, Method::POST] {
        let response = send_json(app.router.clone(), method, "/status", &body).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["id"], job.id.to_string());
        assert_eq!(json["status"], "New");
    }
}

#[tokio::test]
async fn status_of_unknown_job_is_500() {
    let app = build_test_app(ConfirmMode::Ack);
    let id = hellosvc_core::types::new_record_id();
    let body = format!(r#"{{"id":"{id}"}}"#);

    let response = send_json(app.router.clone(), Method::POST, "/status", &body).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, format!("job not found: {id}"));
}

#[tokio::test]
async fn status_with_malformed_body_is_400() {
    let app = build_test_app(ConfirmMode::Ack);

    let response = send_json(app.router.clone(), Method::POST, "/status", "{not json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send_json(app.router.clone(), Method::POST, "/status", r#"{"id":42}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
