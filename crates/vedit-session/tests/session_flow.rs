//! End-to-end session scenarios against a mock backend.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vedit_client::{ClientConfig, JobClient};
use vedit_models::{FilterKind, JobStatus, MediaInfo, ProcessingOptions, Resolution, VideoId, VideoRef};
use vedit_session::{SessionController, SessionError, SessionPhase};
use vedit_store::{MemoryStore, SessionStore, StoreError, StoreResult};
use vedit_stream::StreamConfig;

fn session_for(server: &MockServer, store: Arc<dyn SessionStore>) -> SessionController {
    let client = JobClient::new(ClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        max_retries: 0,
    })
    .expect("client should build");
    let stream_config = StreamConfig {
        base_url: server.uri(),
        connect_timeout: Duration::from_secs(5),
    };
    SessionController::new(client, stream_config, store)
}

fn sample_video(server: &MockServer) -> VideoRef {
    VideoRef::new(
        "sample.mp4",
        format!("{}/sample.mp4", server.uri()),
        MediaInfo::new(20.0, Resolution::new(1280, 720), "mp4"),
    )
    .with_backend_id(VideoId::new("abc.mp4"))
}

async fn mount_start(server: &MockServer, job_id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/process/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "job_id": job_id,
            "message": "Processing started"
        })))
        .mount(server)
        .await;
}

async fn mount_sse(server: &MockServer, job_id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/api/stream/progress/{job_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, job_id: &str, status: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/jobs/{job_id}/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": job_id,
            "status": status,
            "video_id": "abc.mp4",
            "output_video_id": format!("processed_{job_id}.mp4"),
            "stream_url": format!("/api/stream/video/processed_{job_id}.mp4"),
            "download_url": format!("/api/download/processed_{job_id}.mp4")
        })))
        .mount(server)
        .await;
}

fn sse_event(json: &str) -> String {
    format!("data: {json}\n\n")
}

#[tokio::test]
async fn timeline_scenario_matches_playback() {
    let server = MockServer::start().await;
    let mut session = session_for(&server, Arc::new(MemoryStore::new()));
    session.attach_video(sample_video(&server)).unwrap();

    let a = session.add_filter_interval(FilterKind::Grayscale, 2.0, 8.0);
    let b = session.add_filter_interval(FilterKind::Blur, 5.0, 12.0);

    let active = session.filters_at(6.0);
    assert_eq!(active.len(), 2);
    assert_eq!(active[0].id, a);
    assert_eq!(active[0].filter_id, "grayscale");
    assert_eq!(active[1].id, b);
    assert_eq!(active[1].filter_id, "blur");

    assert!(session.filters_at(15.0).is_empty());
    assert_eq!(session.playback_effect(6.0), "grayscale(1) blur(12px)");
}

#[tokio::test]
async fn upload_makes_session_ready() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "Video uploaded successfully",
            "video_id": "f8a1.mp4",
            "original_filename": "holiday.mp4",
            "file_path": "/data/uploads/f8a1.mp4",
            "file_size": 2048
        })))
        .mount(&server)
        .await;

    let mut session = session_for(&server, Arc::new(MemoryStore::new()));
    session.begin_upload().unwrap();
    assert_eq!(session.phase(), SessionPhase::AwaitingUpload);

    let video = session
        .upload(
            "holiday.mp4",
            vec![0u8; 16],
            "file:///tmp/holiday.mp4",
            MediaInfo::new(20.0, Resolution::new(1920, 1080), "mp4"),
        )
        .await
        .unwrap();

    assert_eq!(session.phase(), SessionPhase::Ready);
    assert_eq!(video.backend_id, Some(VideoId::new("f8a1.mp4")));
    assert_eq!(video.byte_size, 2048);
    assert_eq!(session.timeline().duration_seconds(), 20.0);
}

#[tokio::test]
async fn full_processing_flow_succeeds() {
    let server = MockServer::start().await;
    mount_start(&server, "job-1").await;
    mount_status(&server, "job-1", "complete").await;

    let body = [
        sse_event(r#"{"type":"status","data":{"status":"processing"}}"#),
        sse_event(r#"{"type":"progress","data":{"current":50,"total":100,"percentage":50.0,"fps":10.0,"eta_seconds":5.0,"preview_url":"/api/preview/job-1_preview.jpg"}}"#),
        sse_event(r#"{"type":"stream_ready","data":{"stream_url":"/api/stream/video/processed_job-1.mp4","output_video_id":"processed_job-1.mp4"}}"#),
        sse_event(r#"{"type":"status","data":{"status":"complete"}}"#),
    ]
    .concat();
    mount_sse(&server, "job-1", body).await;

    let mut session = session_for(&server, Arc::new(MemoryStore::new()));
    session.attach_video(sample_video(&server)).unwrap();

    session
        .start_processing(ProcessingOptions::default())
        .await
        .unwrap();
    assert_eq!(session.phase(), SessionPhase::Processing);

    // queued -> processing
    session.pump().await.unwrap();
    assert_eq!(session.snapshot().job_status, Some(JobStatus::Running));

    // progress snapshot replaces wholesale
    session.pump().await.unwrap();
    let progress = session.snapshot().progress.expect("progress should be set");
    assert_eq!(progress.frames_done, 50);
    assert_eq!(
        progress.preview_url.as_deref(),
        Some("/api/preview/job-1_preview.jpg")
    );

    // the in-progress output becomes playable
    session.pump().await.unwrap();
    let preview = session.snapshot().live_preview_url.expect("preview url");
    assert_eq!(
        preview,
        format!("{}/api/stream/video/processed_job-1.mp4", server.uri())
    );

    // terminal event: final status is fetched, output recorded
    session.pump().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Succeeded);

    let output = session.output().expect("output video");
    assert_eq!(
        output.backend_id,
        Some(VideoId::new("processed_job-1.mp4"))
    );
    assert_eq!(output.duration_seconds, 20.0);
    assert!(session.snapshot().error.is_none());
    assert!(session.snapshot().job_status.is_none());
}

#[tokio::test]
async fn malformed_progress_events_are_dropped_not_merged() {
    let server = MockServer::start().await;
    mount_start(&server, "job-1").await;
    mount_status(&server, "job-1", "complete").await;

    let body = [
        sse_event(r#"{"type":"progress","data":{"current":10,"total":100}}"#),
        sse_event(r#"{"type":"telemetry","data":{"bogus":true}}"#),
        "data: not json at all\n\n".to_string(),
        sse_event(r#"{"type":"progress","data":{"current":20,"total":100,"percentage":20.0}}"#),
        sse_event(r#"{"type":"status","data":{"status":"complete"}}"#),
    ]
    .concat();
    mount_sse(&server, "job-1", body).await;

    let mut session = session_for(&server, Arc::new(MemoryStore::new()));
    session.attach_video(sample_video(&server)).unwrap();
    session
        .start_processing(ProcessingOptions::default())
        .await
        .unwrap();

    session.pump().await.unwrap();
    let first = session.snapshot().progress.expect("first snapshot");
    assert_eq!(first.frames_done, 10);
    assert_eq!(first.percentage, 0.0);

    // The malformed events are skipped; the next snapshot is the second
    // well-formed one, fully replacing the first.
    session.pump().await.unwrap();
    let second = session.snapshot().progress.expect("second snapshot");
    assert_eq!(second.frames_done, 20);
    assert_eq!(second.percentage, 20.0);

    session.run_to_terminal().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Succeeded);
}

#[tokio::test]
async fn second_start_is_rejected_and_leaves_live_job_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "job_id": "job-1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_status(&server, "job-1", "complete").await;
    mount_sse(
        &server,
        "job-1",
        [
            sse_event(r#"{"type":"progress","data":{"current":1,"total":2}}"#),
            sse_event(r#"{"type":"status","data":{"status":"complete"}}"#),
        ]
        .concat(),
    )
    .await;

    let mut session = session_for(&server, Arc::new(MemoryStore::new()));
    session.attach_video(sample_video(&server)).unwrap();
    session
        .start_processing(ProcessingOptions::default())
        .await
        .unwrap();

    let err = session
        .start_processing(ProcessingOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::JobAlreadyLive));
    assert_eq!(session.phase(), SessionPhase::Processing);

    // The original job and stream still run to completion.
    session.run_to_terminal().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Succeeded);
}

#[tokio::test]
async fn cancel_lands_in_ready_even_when_backend_already_finished() {
    let server = MockServer::start().await;
    mount_start(&server, "job-1").await;
    mount_sse(
        &server,
        "job-1",
        sse_event(r#"{"type":"progress","data":{"current":1,"total":100}}"#),
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path("/api/jobs/job-1/cancel"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": "Job not found"
        })))
        .mount(&server)
        .await;

    let mut session = session_for(&server, Arc::new(MemoryStore::new()));
    session.attach_video(sample_video(&server)).unwrap();
    session
        .start_processing(ProcessingOptions::default())
        .await
        .unwrap();

    session.cancel().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Ready);
    assert!(session.snapshot().job_status.is_none());
    assert!(session.snapshot().progress.is_none());
    assert!(session.snapshot().error.is_none());
}

#[tokio::test]
async fn cancel_outside_processing_is_rejected() {
    let server = MockServer::start().await;
    let mut session = session_for(&server, Arc::new(MemoryStore::new()));
    session.attach_video(sample_video(&server)).unwrap();

    let err = session.cancel().await.unwrap_err();
    assert!(matches!(err, SessionError::NotProcessing));
    assert_eq!(session.phase(), SessionPhase::Ready);
}

#[tokio::test]
async fn connection_loss_is_resolved_by_one_status_recheck() {
    let server = MockServer::start().await;
    mount_start(&server, "job-1").await;
    // Stream dies after one progress event, before any terminal status.
    mount_sse(
        &server,
        "job-1",
        sse_event(r#"{"type":"progress","data":{"current":99,"total":100}}"#),
    )
    .await;
    // The authoritative re-check says the job finished server-side.
    mount_status(&server, "job-1", "complete").await;

    let mut session = session_for(&server, Arc::new(MemoryStore::new()));
    session.attach_video(sample_video(&server)).unwrap();
    session
        .start_processing(ProcessingOptions::default())
        .await
        .unwrap();

    session.run_to_terminal().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Succeeded);
    assert!(session.output().is_some());
}

#[tokio::test]
async fn connection_loss_with_job_still_running_fails() {
    let server = MockServer::start().await;
    mount_start(&server, "job-1").await;
    mount_sse(
        &server,
        "job-1",
        sse_event(r#"{"type":"progress","data":{"current":1,"total":100}}"#),
    )
    .await;
    mount_status(&server, "job-1", "processing").await;

    let mut session = session_for(&server, Arc::new(MemoryStore::new()));
    session.attach_video(sample_video(&server)).unwrap();
    session
        .start_processing(ProcessingOptions::default())
        .await
        .unwrap();

    session.run_to_terminal().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Failed);
    let error = session.snapshot().error.expect("user-facing error");
    assert!(error.contains("progress connection"));
}

#[tokio::test]
async fn backend_reported_failure_carries_its_detail() {
    let server = MockServer::start().await;
    mount_start(&server, "job-1").await;
    mount_sse(
        &server,
        "job-1",
        sse_event(r#"{"type":"status","data":{"status":"failed","error":"CUDA out of memory"}}"#),
    )
    .await;

    let mut session = session_for(&server, Arc::new(MemoryStore::new()));
    session.attach_video(sample_video(&server)).unwrap();
    session
        .start_processing(ProcessingOptions::default())
        .await
        .unwrap();

    session.run_to_terminal().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Failed);
    assert!(session
        .snapshot()
        .error
        .expect("user-facing error")
        .contains("CUDA out of memory"));
}

#[tokio::test]
async fn reprocessing_releases_the_prior_output() {
    let server = MockServer::start().await;
    mount_start(&server, "job-1").await;
    mount_status(&server, "job-1", "complete").await;
    mount_sse(
        &server,
        "job-1",
        [
            sse_event(r#"{"type":"stream_ready","data":{"stream_url":"/api/stream/video/processed_job-1.mp4","output_video_id":"processed_job-1.mp4"}}"#),
            sse_event(r#"{"type":"status","data":{"status":"complete"}}"#),
        ]
        .concat(),
    )
    .await;

    let mut session = session_for(&server, Arc::new(MemoryStore::new()));
    session.attach_video(sample_video(&server)).unwrap();
    session
        .start_processing(ProcessingOptions::default())
        .await
        .unwrap();
    session.run_to_terminal().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Succeeded);
    assert!(session.output().is_some());

    // Succeeded -> Processing: the dangling output reference is released
    // before the new job takes the slot.
    session
        .start_processing(ProcessingOptions::default())
        .await
        .unwrap();
    assert_eq!(session.phase(), SessionPhase::Processing);
    assert!(session.output().is_none());
    assert!(session.snapshot().live_preview_url.is_none());
}

#[tokio::test]
async fn start_without_video_is_rejected() {
    let server = MockServer::start().await;
    let mut session = session_for(&server, Arc::new(MemoryStore::new()));

    let err = session
        .start_processing(ProcessingOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NoVideo));
    assert_eq!(session.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn invalid_options_are_rejected_before_any_request() {
    let server = MockServer::start().await;
    let mut session = session_for(&server, Arc::new(MemoryStore::new()));
    session.attach_video(sample_video(&server)).unwrap();

    let options = ProcessingOptions::default().with_confidence(7.0);
    let err = session.start_processing(options).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidOptions(_)));
    assert_eq!(session.phase(), SessionPhase::Ready);
}

#[tokio::test]
async fn session_restores_video_and_timeline_from_store() {
    let server = MockServer::start().await;
    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());

    {
        let mut session = session_for(&server, Arc::clone(&store));
        session.attach_video(sample_video(&server)).unwrap();
        session.add_filter_interval(FilterKind::Grayscale, 2.0, 8.0);
        session.add_filter_interval(FilterKind::Blur, 5.0, 12.0);
    }

    let client = JobClient::new(ClientConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        max_retries: 0,
    })
    .unwrap();
    let stream_config = StreamConfig {
        base_url: server.uri(),
        connect_timeout: Duration::from_secs(5),
    };
    let session = SessionController::restore(client, stream_config, store);

    assert_eq!(session.phase(), SessionPhase::Ready);
    assert_eq!(
        session.video().and_then(|v| v.backend_id.clone()),
        Some(VideoId::new("abc.mp4"))
    );
    assert_eq!(session.timeline().len(), 2);
    assert_eq!(session.filters_at(6.0).len(), 2);
}

mockall::mock! {
    pub FlakyStore {}

    impl SessionStore for FlakyStore {
        fn load(&self, key: &str) -> StoreResult<Option<String>>;
        fn save(&self, key: &str, value: &str) -> StoreResult<()>;
        fn remove(&self, key: &str) -> StoreResult<()>;
    }
}

#[tokio::test]
async fn store_failures_never_block_editing() {
    let server = MockServer::start().await;

    let mut store = MockFlakyStore::new();
    store
        .expect_save()
        .returning(|_, _| Err(StoreError::Unavailable("disk full".to_string())));
    store.expect_load().returning(|_| Ok(None));
    store.expect_remove().returning(|_| Ok(()));

    let mut session = session_for(&server, Arc::new(store));
    session.attach_video(sample_video(&server)).unwrap();

    // Persistence is best-effort: the edit itself must still land.
    let id = session.add_interval("sepia", "Sepia", 1.0, 3.0);
    assert_eq!(session.filters_at(2.0).len(), 1);
    session.remove_interval(id);
    assert!(session.filters_at(2.0).is_empty());
}
