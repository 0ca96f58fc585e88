//! The session controller state machine.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use validator::Validate;

use vedit_client::{
    FilterPreview, JobClient, JobStatusPayload, PreviewRequest, StartJobRequest,
};
use vedit_models::{
    ApplyRegion, FilterKind, Job, JobId, JobStatus, MediaInfo, ProcessingOptions,
    ProgressSnapshot, Resolution, VideoRef,
};
use vedit_store::{SessionStore, StateCache, OUTPUT_KEY, TIMELINE_KEY, VIDEO_KEY};
use vedit_stream::{ProgressStream, StreamConfig, StreamEvent};
use vedit_timeline::{IntervalId, TimelineEngine, TimelineInterval};

use crate::error::{user_message_for_client, SessionError, SessionResult};

/// Phases of an editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Nothing loaded yet
    Idle,
    /// The user is picking a file
    AwaitingUpload,
    /// A video is loaded and no job is live
    Ready,
    /// A job is live and its progress stream is being consumed
    Processing,
    /// The last job completed and its output is available
    Succeeded,
    /// The last job failed; `error` carries the user-facing message
    Failed,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::AwaitingUpload => "awaiting_upload",
            SessionPhase::Ready => "ready",
            SessionPhase::Processing => "processing",
            SessionPhase::Succeeded => "succeeded",
            SessionPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single live job and its progress subscription.
struct LiveJob {
    job: Job,
    stream: ProgressStream,
}

/// Unified session view for presentation layers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub video: Option<VideoRef>,
    pub output: Option<VideoRef>,
    pub job_status: Option<JobStatus>,
    pub progress: Option<ProgressSnapshot>,
    pub live_preview_url: Option<String>,
    pub error: Option<String>,
}

/// Orchestrates one editing session.
///
/// Single writer over the live-job slot: every mutation of job state goes
/// through `&mut self`, and the timeline is only ever mutated by the direct
/// edit methods, never by the job lifecycle.
pub struct SessionController {
    client: JobClient,
    stream_config: StreamConfig,
    cache: StateCache,
    timeline: TimelineEngine,
    video: Option<VideoRef>,
    output: Option<VideoRef>,
    live: Option<LiveJob>,
    progress: Option<ProgressSnapshot>,
    live_preview_url: Option<String>,
    phase: SessionPhase,
    last_error: Option<String>,
}

impl SessionController {
    /// Create a fresh session.
    pub fn new(client: JobClient, stream_config: StreamConfig, store: Arc<dyn SessionStore>) -> Self {
        Self {
            client,
            stream_config,
            cache: StateCache::new(store),
            timeline: TimelineEngine::new(0.0),
            video: None,
            output: None,
            live: None,
            progress: None,
            live_preview_url: None,
            phase: SessionPhase::Idle,
            last_error: None,
        }
    }

    /// Create a session, restoring any persisted video and timeline.
    ///
    /// The persisted state is a best-effort cache: anything unreadable is
    /// dropped and the session starts idle.
    pub fn restore(client: JobClient, stream_config: StreamConfig, store: Arc<dyn SessionStore>) -> Self {
        let mut session = Self::new(client, stream_config, store);

        let video = match session.cache.load_json::<VideoRef>(VIDEO_KEY) {
            Ok(video) => video,
            Err(e) => {
                warn!(error = %e, "could not read cached video");
                None
            }
        };

        if let Some(video) = video {
            let intervals = match session.cache.load_json::<Vec<TimelineInterval>>(TIMELINE_KEY) {
                Ok(Some(list)) => list,
                Ok(None) => Vec::new(),
                Err(e) => {
                    warn!(error = %e, "could not read cached timeline");
                    Vec::new()
                }
            };
            session.timeline = TimelineEngine::restore(video.duration_seconds, intervals);
            session.output = session.cache.load_json::<VideoRef>(OUTPUT_KEY).unwrap_or_else(|e| {
                warn!(error = %e, "could not read cached output");
                None
            });
            info!(video = %video.display_name, "session restored from cache");
            session.video = Some(video);
            session.phase = SessionPhase::Ready;
        }

        session
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn video(&self) -> Option<&VideoRef> {
        self.video.as_ref()
    }

    pub fn output(&self) -> Option<&VideoRef> {
        self.output.as_ref()
    }

    pub fn timeline(&self) -> &TimelineEngine {
        &self.timeline
    }

    /// Unified view of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            video: self.video.clone(),
            output: self.output.clone(),
            job_status: self.live.as_ref().map(|l| l.job.status),
            progress: self.progress.clone(),
            live_preview_url: self.live_preview_url.clone(),
            error: self.last_error.clone(),
        }
    }

    /// Enter the upload phase.
    pub fn begin_upload(&mut self) -> SessionResult<()> {
        if self.live.is_some() {
            return Err(SessionError::JobAlreadyLive);
        }
        self.phase = SessionPhase::AwaitingUpload;
        Ok(())
    }

    /// Upload a video file and make it the session's source.
    ///
    /// `source_url` is where the presentation layer will play the source
    /// from (a local file URI or equivalent); `info` is the playback
    /// metadata it probed.
    pub async fn upload(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
        source_url: impl Into<String>,
        info: MediaInfo,
    ) -> SessionResult<VideoRef> {
        if self.live.is_some() {
            return Err(SessionError::JobAlreadyLive);
        }

        let byte_size = bytes.len() as u64;
        let uploaded = self
            .client
            .upload(file_name, bytes)
            .await
            .map_err(SessionError::from_client)?;

        let video = VideoRef::new(uploaded.original_filename.clone(), source_url, info)
            .with_backend_id(uploaded.video_id)
            .with_byte_size(if uploaded.file_size > 0 {
                uploaded.file_size
            } else {
                byte_size
            });

        self.install_video(video.clone());
        Ok(video)
    }

    /// Make an already-acquired asset (e.g. the sample video) the session's
    /// source.
    pub fn attach_video(&mut self, video: VideoRef) -> SessionResult<()> {
        if self.live.is_some() {
            return Err(SessionError::JobAlreadyLive);
        }
        self.install_video(video);
        Ok(())
    }

    /// Start a processing job for the current video.
    ///
    /// Rejected with [`SessionError::JobAlreadyLive`] while a job is live;
    /// the existing job and stream are left untouched.
    pub async fn start_processing(&mut self, options: ProcessingOptions) -> SessionResult<JobId> {
        if self.live.is_some() {
            return Err(SessionError::JobAlreadyLive);
        }
        let Some(video) = self.video.clone() else {
            return Err(SessionError::NoVideo);
        };
        let Some(backend_id) = video.backend_id.clone() else {
            return Err(SessionError::VideoNotUploaded);
        };
        options
            .validate()
            .map_err(|e| SessionError::InvalidOptions(e.to_string()))?;

        // Reprocessing: drop references to the prior output's transient
        // assets before the new job takes the slot.
        if self.phase == SessionPhase::Succeeded {
            self.release_output();
        }

        let request = StartJobRequest::from_options(backend_id, &options);
        let job_id = self
            .client
            .start(&request)
            .await
            .map_err(SessionError::from_client)?;

        let stream = match ProgressStream::connect(&self.stream_config, &job_id).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "progress subscription failed; cancelling job");
                if let Err(cancel_err) = self.client.cancel(&job_id).await {
                    warn!(job_id = %job_id, error = %cancel_err, "cancel after failed subscription also failed");
                }
                return Err(SessionError::from_stream(e));
            }
        };

        info!(job_id = %job_id, filter = %options.filter, "processing started");
        self.live = Some(LiveJob {
            job: Job::new(job_id.clone(), video, options),
            stream,
        });
        self.progress = None;
        self.live_preview_url = None;
        self.last_error = None;
        self.phase = SessionPhase::Processing;
        Ok(job_id)
    }

    /// Consume one progress-stream event; a no-op outside `Processing`.
    ///
    /// Returns the phase after the event was applied.
    pub async fn pump(&mut self) -> SessionResult<SessionPhase> {
        if self.phase != SessionPhase::Processing {
            return Ok(self.phase);
        }

        let (job_id, outcome) = {
            let Some(live) = self.live.as_mut() else {
                return Ok(self.phase);
            };
            let job_id = live.job.job_id.clone();
            let outcome = live.stream.next_event().await;
            (job_id, outcome)
        };

        match outcome {
            Ok(Some(event)) => self.apply_event(&job_id, event).await,
            Ok(None) => Ok(self.phase),
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "progress stream lost; re-checking job status once");
                self.reconcile_after_loss(&job_id).await
            }
        }
    }

    /// Pump until the session leaves `Processing`.
    pub async fn run_to_terminal(&mut self) -> SessionResult<SessionPhase> {
        while self.phase == SessionPhase::Processing {
            self.pump().await?;
        }
        Ok(self.phase)
    }

    /// Cancel the live job and return the session to a clean restart point.
    ///
    /// Always lands in `Ready`, whether or not the backend still knew the
    /// job: cancellation racing completion is expected.
    pub async fn cancel(&mut self) -> SessionResult<()> {
        if self.phase != SessionPhase::Processing {
            return Err(SessionError::NotProcessing);
        }
        let Some(mut live) = self.live.take() else {
            return Err(SessionError::NotProcessing);
        };

        if let Err(e) = self.client.cancel(&live.job.job_id).await {
            warn!(job_id = %live.job.job_id, error = %e, "cancel request failed");
        }
        live.stream.close();

        self.progress = None;
        self.live_preview_url = None;
        self.last_error = None;
        self.phase = SessionPhase::Ready;
        info!(job_id = %live.job.job_id, "job cancelled, session ready");
        Ok(())
    }

    /// Per-filter previews for the current video; a side read with no
    /// session-state effect.
    pub async fn filter_previews(
        &self,
        confidence_threshold: f32,
        region: ApplyRegion,
    ) -> SessionResult<Vec<FilterPreview>> {
        let Some(backend_id) = self.video.as_ref().and_then(|v| v.backend_id.clone()) else {
            return Err(SessionError::VideoNotUploaded);
        };

        self.client
            .extract_previews(&PreviewRequest {
                video_id: backend_id,
                confidence_threshold,
                apply_to: region,
            })
            .await
            .map_err(SessionError::from_client)
    }

    // ---- timeline mediation ------------------------------------------------

    /// Add a filter interval; persisted on every mutation.
    pub fn add_interval(&mut self, filter_id: &str, label: &str, start: f64, end: f64) -> IntervalId {
        let id = self.timeline.add(filter_id, label, start, end);
        self.persist_timeline();
        id
    }

    /// Add an interval for one of the backend filters.
    pub fn add_filter_interval(&mut self, filter: FilterKind, start: f64, end: f64) -> IntervalId {
        self.add_interval(filter.as_str(), filter.display_name(), start, end)
    }

    pub fn remove_interval(&mut self, id: IntervalId) {
        self.timeline.remove(id);
        self.persist_timeline();
    }

    pub fn resize_interval(&mut self, id: IntervalId, start: f64, end: f64) {
        self.timeline.resize(id, start, end);
        self.persist_timeline();
    }

    /// Filters active at playback instant `t`, in composition order.
    pub fn filters_at(&self, t: f64) -> Vec<&TimelineInterval> {
        self.timeline.active_at(t)
    }

    /// Concatenated effect string for playback instant `t`.
    pub fn playback_effect(&self, t: f64) -> String {
        self.timeline.playback_effect(t)
    }

    // ---- internals ---------------------------------------------------------

    fn install_video(&mut self, video: VideoRef) {
        self.timeline = TimelineEngine::new(video.duration_seconds);
        self.release_output();
        self.last_error = None;
        self.persist_video(&video);
        self.persist_timeline();
        info!(video = %video.display_name, duration = video.duration_seconds, "video attached");
        self.video = Some(video);
        self.phase = SessionPhase::Ready;
    }

    async fn apply_event(&mut self, job_id: &JobId, event: StreamEvent) -> SessionResult<SessionPhase> {
        // Stale guard: anything not belonging to the current live job is
        // discarded, as is anything arriving after terminal handling began.
        let still_live = self
            .live
            .as_ref()
            .map(|l| &l.job.job_id == job_id)
            .unwrap_or(false);
        if !still_live || self.phase != SessionPhase::Processing {
            debug!(job_id = %job_id, "discarding event for a job the session moved past");
            return Ok(self.phase);
        }

        match event {
            StreamEvent::Progress(snapshot) => {
                // Wholesale replacement; fields are never merged.
                self.progress = Some(snapshot);
            }
            StreamEvent::StatusChanged(status) => {
                if let Some(live) = self.live.as_mut() {
                    live.job.status = status;
                }
            }
            StreamEvent::PreviewReady { stream_url, .. } => {
                self.live_preview_url = Some(self.client.absolute_url(&stream_url));
            }
            StreamEvent::Terminal { status, error } => {
                return self.finish_job(job_id, status, error).await;
            }
        }
        Ok(self.phase)
    }

    async fn finish_job(
        &mut self,
        job_id: &JobId,
        status: JobStatus,
        error: Option<String>,
    ) -> SessionResult<SessionPhase> {
        match status {
            JobStatus::Complete => self.finish_success(job_id).await,
            JobStatus::Failed => {
                let detail = error.unwrap_or_else(|| "no detail provided".to_string());
                self.fail(format!("Processing failed: {detail}"));
                Ok(self.phase)
            }
            JobStatus::Cancelled => {
                self.fail("The job was cancelled on the server.".to_string());
                Ok(self.phase)
            }
            // Terminal events never carry a live status.
            JobStatus::Pending | JobStatus::Running => Ok(self.phase),
        }
    }

    /// Fetch the authoritative final payload and build the output reference.
    async fn finish_success(&mut self, job_id: &JobId) -> SessionResult<SessionPhase> {
        match self.client.status(job_id).await {
            Ok(payload) => {
                self.complete_with(job_id, &payload);
                Ok(self.phase)
            }
            Err(e) => {
                self.fail(user_message_for_client(&e));
                Ok(self.phase)
            }
        }
    }

    fn complete_with(&mut self, job_id: &JobId, payload: &JobStatusPayload) {
        // Stale guard around the fetch that produced this payload.
        let still_live = self
            .live
            .as_ref()
            .map(|l| &l.job.job_id == job_id)
            .unwrap_or(false);
        if !still_live {
            debug!(job_id = %job_id, "discarding final payload for a job the session moved past");
            return;
        }

        let output = self.build_output(payload);
        self.live = None;
        self.progress = None;
        self.live_preview_url = None;
        self.last_error = None;
        if let Err(e) = self.cache.save_json(OUTPUT_KEY, &output) {
            warn!(error = %e, "could not persist output reference");
        }
        self.output = Some(output);
        self.phase = SessionPhase::Succeeded;
        info!(job_id = %job_id, "processing succeeded");
    }

    /// The one authoritative re-check after a lost stream connection.
    async fn reconcile_after_loss(&mut self, job_id: &JobId) -> SessionResult<SessionPhase> {
        match self.client.status(job_id).await {
            Ok(payload) => match payload.status {
                JobStatus::Complete => {
                    info!(job_id = %job_id, "job completed while the stream was down");
                    self.complete_with(job_id, &payload);
                    Ok(self.phase)
                }
                JobStatus::Failed => {
                    let detail = payload
                        .error
                        .clone()
                        .unwrap_or_else(|| "no detail provided".to_string());
                    self.fail(format!("Processing failed: {detail}"));
                    Ok(self.phase)
                }
                JobStatus::Cancelled => {
                    self.fail("The job was cancelled on the server.".to_string());
                    Ok(self.phase)
                }
                JobStatus::Pending | JobStatus::Running => {
                    self.fail(
                        "Lost the progress connection while the job was still running."
                            .to_string(),
                    );
                    Ok(self.phase)
                }
            },
            Err(e) => {
                self.fail(user_message_for_client(&e));
                Ok(self.phase)
            }
        }
    }

    fn fail(&mut self, message: String) {
        warn!("session failed: {}", message);
        if let Some(mut live) = self.live.take() {
            live.stream.close();
        }
        self.progress = None;
        self.live_preview_url = None;
        self.last_error = Some(message);
        self.phase = SessionPhase::Failed;
    }

    fn release_output(&mut self) {
        self.output = None;
        self.live_preview_url = None;
        self.progress = None;
        if let Err(e) = self.cache.remove(OUTPUT_KEY) {
            warn!(error = %e, "could not drop cached output reference");
        }
    }

    fn build_output(&self, payload: &JobStatusPayload) -> VideoRef {
        let (duration, resolution, format) = self
            .video
            .as_ref()
            .map(|v| (v.duration_seconds, v.resolution, v.format.clone()))
            .unwrap_or((0.0, Resolution::new(0, 0), "mp4".to_string()));
        let display_name = self
            .video
            .as_ref()
            .map(|v| format!("{} (processed)", v.display_name))
            .unwrap_or_else(|| "processed output".to_string());

        let source_url = payload
            .stream_url
            .as_deref()
            .map(|u| self.client.absolute_url(u))
            .or_else(|| {
                payload
                    .output_video_id
                    .as_ref()
                    .map(|id| self.client.stream_url(id))
            })
            .unwrap_or_default();

        let mut output = VideoRef::new(display_name, source_url, MediaInfo::new(duration, resolution, format));
        if let Some(id) = payload.output_video_id.clone() {
            output = output.with_backend_id(id);
        }
        output
    }

    fn persist_video(&self, video: &VideoRef) {
        if let Err(e) = self.cache.save_json(VIDEO_KEY, video) {
            warn!(error = %e, "could not persist video reference");
        }
    }

    fn persist_timeline(&self) {
        if let Err(e) = self.cache.save_json(TIMELINE_KEY, self.timeline.intervals()) {
            warn!(error = %e, "could not persist timeline");
        }
    }
}
