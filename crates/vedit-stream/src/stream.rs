//! The progress-stream state machine.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use vedit_models::{JobId, JobStatus, ProgressSnapshot, StreamMessage, VideoId};

use crate::error::{StreamError, StreamResult};
use crate::sse::SseParser;

/// Configuration for progress subscriptions.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Base URL of the processing backend
    pub base_url: String,
    /// Timeout for establishing the subscription
    pub connect_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl StreamConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("VEDIT_BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("VEDIT_STREAM_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        }
    }
}

/// Lifecycle of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Connecting,
    Streaming,
    Closed(CloseReason),
}

/// Why a subscription closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Complete,
    Failed,
    Cancelled,
    Errored,
}

/// A typed update delivered by the stream.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// New progress snapshot, replacing the previous one wholesale
    Progress(ProgressSnapshot),
    /// Non-terminal status change (e.g. queued → processing)
    StatusChanged(JobStatus),
    /// The in-progress output became playable
    PreviewReady {
        stream_url: String,
        output_video_id: VideoId,
    },
    /// Terminal status; this is the last event the stream delivers
    Terminal {
        status: JobStatus,
        error: Option<String>,
    },
}

/// Backend answer when the subscribed job is unknown: a bare error object
/// with no envelope.
#[derive(Debug, Deserialize)]
struct BareError {
    error: String,
}

/// The raw chunk feed a stream consumes; exposed so embedders can fake a
/// subscription without a network.
pub type ByteFeed = Pin<Box<dyn Stream<Item = Result<Vec<u8>, StreamError>> + Send>>;

/// One live subscription to a job's progress events.
///
/// Single-shot: after the terminal event (or a forced [`close`]) the
/// instance only ever reports `Ok(None)`.
///
/// [`close`]: ProgressStream::close
pub struct ProgressStream {
    job_id: JobId,
    state: StreamState,
    feed: Option<ByteFeed>,
    parser: SseParser,
    pending: VecDeque<String>,
}

impl ProgressStream {
    /// Open a subscription for `job_id`.
    pub async fn connect(config: &StreamConfig, job_id: &JobId) -> StreamResult<Self> {
        let url = format!("{}/api/stream/progress/{}", config.base_url, job_id);
        debug!("Opening progress stream {}", url);

        // No total request timeout: the subscription lives as long as the job.
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(StreamError::Connect)?;

        let response = http.get(&url).send().await.map_err(StreamError::Connect)?;
        if !response.status().is_success() {
            return Err(StreamError::Refused(response.status().as_u16()));
        }

        let feed: ByteFeed = Box::pin(
            response
                .bytes_stream()
                .map(|chunk| match chunk {
                    Ok(bytes) => Ok(bytes.to_vec()),
                    Err(e) => Err(StreamError::ConnectionLost(e.to_string())),
                }),
        );

        Ok(Self::from_feed(job_id.clone(), feed))
    }

    /// Build a stream over an already-established byte feed.
    pub fn from_feed(job_id: JobId, feed: ByteFeed) -> Self {
        Self {
            job_id,
            state: StreamState::Streaming,
            feed: Some(feed),
            parser: SseParser::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, StreamState::Closed(_))
    }

    /// Force-close the subscription irrespective of its current state.
    pub fn close(&mut self) {
        if !self.is_closed() {
            self.finish(CloseReason::Cancelled);
        }
    }

    /// Deliver the next typed event.
    ///
    /// - `Ok(Some(_))`: a well-formed update; a `Terminal` update closes
    ///   the stream as a side effect.
    /// - `Ok(None)`: the stream is closed; nothing more will arrive.
    /// - `Err(ConnectionLost)`: the transport died (including a silent EOF
    ///   before any terminal event). The caller decides how to reconcile.
    pub async fn next_event(&mut self) -> StreamResult<Option<StreamEvent>> {
        loop {
            if self.is_closed() {
                return Ok(None);
            }

            if let Some(data) = self.pending.pop_front() {
                match self.decode(&data) {
                    Some(StreamEvent::Terminal { status, error }) => {
                        self.finish(close_reason_for(status));
                        return Ok(Some(StreamEvent::Terminal { status, error }));
                    }
                    Some(event) => return Ok(Some(event)),
                    None => continue,
                }
            }

            let Some(feed) = self.feed.as_mut() else {
                return Ok(None);
            };

            match feed.next().await {
                Some(Ok(chunk)) => {
                    self.pending.extend(self.parser.push(&chunk));
                }
                Some(Err(e)) => {
                    self.finish(CloseReason::Errored);
                    return Err(e);
                }
                None => {
                    // The backend only closes after a terminal status event,
                    // so a silent EOF means the true job state is unknown.
                    self.finish(CloseReason::Errored);
                    return Err(StreamError::ConnectionLost(
                        "stream ended before a terminal status".to_string(),
                    ));
                }
            }
        }
    }

    fn finish(&mut self, reason: CloseReason) {
        self.state = StreamState::Closed(reason);
        self.feed = None;
        self.pending.clear();
    }

    /// Decode one event payload; malformed payloads are dropped, not fatal.
    fn decode(&self, data: &str) -> Option<StreamEvent> {
        match serde_json::from_str::<StreamMessage>(data) {
            Ok(StreamMessage::Progress(snapshot)) => Some(StreamEvent::Progress(snapshot)),
            Ok(StreamMessage::Status { status, error }) => {
                if status.is_terminal() {
                    Some(StreamEvent::Terminal { status, error })
                } else {
                    Some(StreamEvent::StatusChanged(status))
                }
            }
            Ok(StreamMessage::StreamReady {
                stream_url,
                output_video_id,
            }) => Some(StreamEvent::PreviewReady {
                stream_url,
                output_video_id,
            }),
            Err(envelope_err) => {
                // The unknown-job answer is a bare {"error": ...} object and
                // the backend closes right after sending it.
                if let Ok(bare) = serde_json::from_str::<BareError>(data) {
                    return Some(StreamEvent::Terminal {
                        status: JobStatus::Failed,
                        error: Some(bare.error),
                    });
                }
                warn!(
                    job_id = %self.job_id,
                    error = %envelope_err,
                    "dropping malformed stream event"
                );
                None
            }
        }
    }
}

fn close_reason_for(status: JobStatus) -> CloseReason {
    match status {
        JobStatus::Complete => CloseReason::Complete,
        JobStatus::Failed => CloseReason::Failed,
        JobStatus::Cancelled => CloseReason::Cancelled,
        // Unreachable for live statuses; terminal check precedes this.
        JobStatus::Pending | JobStatus::Running => CloseReason::Errored,
    }
}
