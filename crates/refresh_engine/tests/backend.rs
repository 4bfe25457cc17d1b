use pretty_assertions::assert_eq;
use refresh_core::{
    FieldError, JobConfiguration, JobHandle, JobKind, JobStatus, SubmissionErrorKind,
};
use refresh_engine::{BackendFailure, BackendSettings, JobBackend, ReqwestBackend};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> ReqwestBackend {
    ReqwestBackend::new(BackendSettings {
        base_url: format!("{}/api/v1/", server.uri()),
        catalog_page_size: 2,
        ..BackendSettings::default()
    })
    .expect("backend")
}

#[tokio::test]
async fn submit_posts_payload_and_returns_handle() {
    let server = MockServer::start().await;
    let spec = JobConfiguration::with_defaults(JobKind::CollectPosts).to_submission_payload();
    Mock::given(method("POST"))
        .and(path("/api/v1/run-advanced-data-refresh/"))
        .and(body_json(&spec))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "message": "Advanced data refresh started",
            "task_id": "abc123",
            "details": {"post_refresh_mode": "new_only"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = backend_for(&server).submit_job(&spec).await.expect("submitted");
    assert_eq!(ack.handle, JobHandle::new("abc123"));
    assert_eq!(ack.message.as_deref(), Some("Advanced data refresh started"));
    assert_eq!(ack.details, Some(json!({"post_refresh_mode": "new_only"})));
}

#[tokio::test]
async fn submit_maps_field_errors_to_validation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/run-advanced-data-refresh/"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [
                {
                    "loc": ["body", "post_refresh_days"],
                    "msg": "ensure this value is less than or equal to 365",
                    "type": "value_error"
                }
            ]
        })))
        .mount(&server)
        .await;

    let spec = JobConfiguration::with_defaults(JobKind::CollectPosts).to_submission_payload();
    let err = backend_for(&server).submit_job(&spec).await.unwrap_err();
    assert_eq!(err.kind, SubmissionErrorKind::Validation);
    assert_eq!(
        err.field_errors,
        vec![FieldError {
            field: "post_refresh_days".to_string(),
            message: "ensure this value is less than or equal to 365".to_string(),
        }]
    );
}

#[tokio::test]
async fn submit_uses_detail_string_for_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/run-advanced-data-refresh/"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "Failed to queue task"})),
        )
        .mount(&server)
        .await;

    let spec = JobConfiguration::with_defaults(JobKind::CollectComments).to_submission_payload();
    let err = backend_for(&server).submit_job(&spec).await.unwrap_err();
    assert_eq!(err.kind, SubmissionErrorKind::Unknown);
    assert_eq!(err.detail, "Failed to queue task");
}

#[tokio::test]
async fn submit_reports_unreachable_backend_as_network() {
    let backend = ReqwestBackend::new(BackendSettings {
        base_url: "http://127.0.0.1:9/api/v1".to_string(),
        ..BackendSettings::default()
    })
    .expect("backend");
    let spec = JobConfiguration::with_defaults(JobKind::CollectPosts).to_submission_payload();

    let err = backend.submit_job(&spec).await.unwrap_err();
    assert_eq!(err.kind, SubmissionErrorKind::Network);
}

#[tokio::test]
async fn status_maps_progress_meta() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/task-status/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "abc123",
            "status": "PROGRESS",
            "ready": false,
            "meta": {
                "current_step": "Refreshing channel 2 of 5",
                "progress": 40,
                "processed_count": 2,
                "total_to_process": 5
            }
        })))
        .mount(&server)
        .await;

    let snapshot = backend_for(&server)
        .query_job_status(&JobHandle::new("abc123"))
        .await
        .expect("status");
    assert_eq!(snapshot.status, JobStatus::Started);
    assert_eq!(snapshot.progress_percent, 40);
    assert_eq!(snapshot.current_step.as_deref(), Some("Refreshing channel 2 of 5"));
    assert_eq!(snapshot.processed_count, Some(2));
    assert_eq!(snapshot.total_to_process, Some(5));
}

#[tokio::test]
async fn status_keeps_readable_meta_fields_next_to_odd_ones() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/task-status/mixed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "mixed",
            "status": "FAILURE",
            "meta": {
                "current_step": ["not", "text"],
                "progress": 60,
                "processed_count": 3.0,
                "total_to_process": "7",
                "error": "Flood wait on channel 4",
                "raw_info_on_failure": {"exc_type": "FloodWaitError"}
            }
        })))
        .mount(&server)
        .await;

    let snapshot = backend_for(&server)
        .query_job_status(&JobHandle::new("mixed"))
        .await
        .expect("status");
    assert_eq!(snapshot.status, JobStatus::Failure);
    assert_eq!(snapshot.progress_percent, 60);
    assert_eq!(snapshot.processed_count, Some(3));
    assert_eq!(snapshot.total_to_process, Some(7));
    assert_eq!(snapshot.error_message.as_deref(), Some("Flood wait on channel 4"));
    assert_eq!(snapshot.failure_detail, Some(json!({"exc_type": "FloodWaitError"})));
}

#[tokio::test]
async fn status_success_defaults_progress_and_summary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/task-status/done"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "done",
            "status": "SUCCESS",
            "ready": true,
            "result": "12 posts refreshed"
        })))
        .mount(&server)
        .await;

    let snapshot = backend_for(&server)
        .query_job_status(&JobHandle::new("done"))
        .await
        .expect("status");
    assert_eq!(snapshot.status, JobStatus::Success);
    assert_eq!(snapshot.progress_percent, 100);
    assert_eq!(snapshot.result_summary.as_deref(), Some("12 posts refreshed"));
}

#[tokio::test]
async fn status_failure_falls_back_to_error_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/task-status/bad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "bad",
            "status": "FAILURE",
            "ready": true,
            "error_info": "ValueError('channel not found')",
            "meta": {"progress": 250, "raw_info_on_failure": {"exc_type": "ValueError"}}
        })))
        .mount(&server)
        .await;

    let snapshot = backend_for(&server)
        .query_job_status(&JobHandle::new("bad"))
        .await
        .expect("status");
    assert_eq!(snapshot.status, JobStatus::Failure);
    assert_eq!(snapshot.progress_percent, 100);
    assert_eq!(
        snapshot.error_message.as_deref(),
        Some("ValueError('channel not found')")
    );
    assert_eq!(snapshot.failure_detail, Some(json!({"exc_type": "ValueError"})));
}

#[tokio::test]
async fn status_unknown_state_is_still_running() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/task-status/odd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "odd",
            "status": "RECEIVED"
        })))
        .mount(&server)
        .await;

    let snapshot = backend_for(&server)
        .query_job_status(&JobHandle::new("odd"))
        .await
        .expect("status");
    assert_eq!(snapshot.status, JobStatus::Started);
    assert!(!snapshot.is_terminal());
}

#[tokio::test]
async fn status_http_error_carries_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/task-status/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not Found"})))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .query_job_status(&JobHandle::new("gone"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, BackendFailure::HttpStatus(404));
    assert_eq!(err.message, "Not Found");
}

#[tokio::test]
async fn status_garbage_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/task-status/junk"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .query_job_status(&JobHandle::new("junk"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, BackendFailure::Malformed);
}

#[tokio::test]
async fn channels_are_fetched_page_by_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/channels/"))
        .and(query_param("skip", "0"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_channels": 3,
            "channels": [
                {"id": 1, "title": "News", "username": "news", "is_active": true},
                {"id": 2, "title": "Old", "username": null, "is_active": false}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/channels/"))
        .and(query_param("skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_channels": 3,
            "channels": [{"id": 3, "title": "Sports", "username": "sports", "is_active": true}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let channels = backend_for(&server).fetch_channels().await.expect("channels");
    let ids: Vec<i64> = channels.iter().map(|ch| ch.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(!channels[1].is_active);
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = ReqwestBackend::new(BackendSettings {
        base_url: "not a url".to_string(),
        ..BackendSettings::default()
    })
    .unwrap_err();
    assert_eq!(err.kind, BackendFailure::InvalidUrl);
}
