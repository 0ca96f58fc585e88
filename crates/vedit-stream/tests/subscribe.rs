//! ProgressStream tests over a real HTTP subscription.

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vedit_models::JobId;
use vedit_stream::{CloseReason, ProgressStream, StreamConfig, StreamError, StreamEvent, StreamState};

fn config_for(server: &MockServer) -> StreamConfig {
    StreamConfig {
        base_url: server.uri(),
        connect_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn subscribes_and_consumes_full_event_sequence() {
    let body = concat!(
        "data: {\"type\":\"status\",\"data\":{\"status\":\"processing\"}}\n\n",
        ": keepalive\n\n",
        "data: {\"type\":\"progress\",\"data\":{\"current\":50,\"total\":100,\"percentage\":50.0,\"fps\":10.0,\"eta_seconds\":5.0}}\n\n",
        "data: {\"type\":\"stream_ready\",\"data\":{\"stream_url\":\"/api/stream/video/out.mp4\",\"output_video_id\":\"out.mp4\"}}\n\n",
        "data: {\"type\":\"status\",\"data\":{\"status\":\"complete\"}}\n\n",
    );

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stream/progress/job-9"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let mut stream = ProgressStream::connect(&config_for(&server), &JobId::new("job-9"))
        .await
        .unwrap();
    assert_eq!(stream.state(), StreamState::Streaming);

    let mut kinds = Vec::new();
    while let Some(event) = stream.next_event().await.unwrap() {
        kinds.push(match event {
            StreamEvent::StatusChanged(_) => "status",
            StreamEvent::Progress(_) => "progress",
            StreamEvent::PreviewReady { .. } => "preview",
            StreamEvent::Terminal { .. } => "terminal",
        });
    }

    assert_eq!(kinds, vec!["status", "progress", "preview", "terminal"]);
    assert_eq!(stream.state(), StreamState::Closed(CloseReason::Complete));
}

#[tokio::test]
async fn truncated_body_reports_connection_lost() {
    // Body ends after a progress event without any terminal status.
    let body = "data: {\"type\":\"progress\",\"data\":{\"current\":5,\"total\":100}}\n\n";

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stream/progress/job-9"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let mut stream = ProgressStream::connect(&config_for(&server), &JobId::new("job-9"))
        .await
        .unwrap();

    assert!(matches!(
        stream.next_event().await.unwrap(),
        Some(StreamEvent::Progress(_))
    ));
    assert!(matches!(
        stream.next_event().await.unwrap_err(),
        StreamError::ConnectionLost(_)
    ));
}

#[tokio::test]
async fn non_success_subscription_is_refused() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stream/progress/job-9"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = ProgressStream::connect(&config_for(&server), &JobId::new("job-9"))
        .await
        .err()
        .expect("subscription should fail");
    assert!(matches!(err, StreamError::Refused(500)));
}
