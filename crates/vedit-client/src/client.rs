//! Backend HTTP client.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, error, warn};

use vedit_models::{JobId, VideoId};

use crate::error::{ClientError, ClientResult};
use crate::types::{
    ErrorBody, FilterPreview, JobStatusPayload, PreviewRequest, PreviewResponse, StartJobRequest,
    StartJobResponse, UploadResponse,
};

/// Configuration for the backend client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the processing backend
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries for idempotent reads
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("VEDIT_BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
            timeout: Duration::from_secs(
                std::env::var("VEDIT_BACKEND_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_retries: std::env::var("VEDIT_BACKEND_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }
}

/// Client for the video processing backend.
///
/// Pure request/response: no state is held beyond configuration, so the
/// session layer stays the single owner of job lifecycle state.
pub struct JobClient {
    http: Client,
    config: ClientConfig,
}

impl JobClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Transport)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Playback URL for a backend video id.
    pub fn stream_url(&self, video_id: &VideoId) -> String {
        format!("{}/api/stream/video/{}", self.config.base_url, video_id)
    }

    /// Download URL for a backend video id.
    pub fn download_url(&self, video_id: &VideoId) -> String {
        format!("{}/api/download/{}", self.config.base_url, video_id)
    }

    /// Resolve a backend-relative asset path against the base URL.
    pub fn absolute_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.config.base_url, path)
        }
    }

    /// Check whether the backend is reachable.
    pub async fn health_check(&self) -> ClientResult<bool> {
        let url = format!("{}/hello-world", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => Ok(true),
            Ok(response) => {
                warn!("Backend health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Backend health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Upload a video file.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> ClientResult<UploadResponse> {
        let url = format!("{}/api/upload", self.config.base_url);

        debug!("Uploading {} ({} bytes) to {}", file_name, bytes.len(), url);

        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        if !response.status().is_success() {
            return Err(self.decode_rejection(response).await);
        }

        self.decode_json(response, "upload").await
    }

    /// Start a processing job, returning its backend identifier.
    ///
    /// Deliberately not retried: a retried start could leave two live jobs
    /// server-side for one session.
    pub async fn start(&self, request: &StartJobRequest) -> ClientResult<JobId> {
        let url = format!("{}/api/process/start", self.config.base_url);

        debug!(
            "Starting {} job for video {}",
            request.filter_type, request.video_id
        );

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        if !response.status().is_success() {
            return Err(self.decode_rejection(response).await);
        }

        let body: StartJobResponse = self.decode_json(response, "process/start").await?;
        body.job_id.ok_or_else(|| {
            error!("Backend start envelope is missing job_id");
            ClientError::malformed("start response carried no job_id")
        })
    }

    /// Fetch the current status of a job.
    pub async fn status(&self, job_id: &JobId) -> ClientResult<JobStatusPayload> {
        let url = format!("{}/api/jobs/{}/status", self.config.base_url, job_id);

        let response = self
            .with_retry(|| async {
                self.http
                    .get(&url)
                    .send()
                    .await
                    .map_err(ClientError::Transport)
            })
            .await?;

        if !response.status().is_success() {
            return Err(self.decode_rejection(response).await);
        }

        self.decode_json(response, "job status").await
    }

    /// Cancel a job, best-effort.
    ///
    /// A job that already reached a terminal state server-side answers with
    /// an error status; that race is expected and only logged.
    pub async fn cancel(&self, job_id: &JobId) -> ClientResult<()> {
        let url = format!("{}/api/jobs/{}/cancel", self.config.base_url, job_id);

        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(ClientError::Transport)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => {
                warn!("Cancel of job {} raced its completion ({})", job_id, response.status());
                Ok(())
            }
            status => {
                let reason = self.read_error_body(response).await;
                Err(ClientError::rejected(status.as_u16(), reason))
            }
        }
    }

    /// Generate per-filter previews from the video's first keyframe.
    ///
    /// A side read with no session-state effect; individual entries may fail
    /// independently.
    pub async fn extract_previews(&self, request: &PreviewRequest) -> ClientResult<Vec<FilterPreview>> {
        let url = format!("{}/api/extract-filter-previews", self.config.base_url);

        let response = self
            .with_retry(|| async {
                self.http
                    .post(&url)
                    .json(request)
                    .send()
                    .await
                    .map_err(ClientError::Transport)
            })
            .await?;

        if !response.status().is_success() {
            return Err(self.decode_rejection(response).await);
        }

        let body: PreviewResponse = self.decode_json(response, "filter previews").await?;
        Ok(body.previews)
    }

    /// Decode a success body, treating decode failure as a contract violation.
    async fn decode_json<T: serde::de::DeserializeOwned>(
        &self,
        response: Response,
        context: &str,
    ) -> ClientResult<T> {
        let text = response.text().await.map_err(ClientError::Transport)?;
        serde_json::from_str(&text).map_err(|e| {
            error!("Malformed {} response from backend: {}", context, e);
            ClientError::malformed(format!("{context}: {e}"))
        })
    }

    /// Map a non-success response to the error taxonomy.
    async fn decode_rejection(&self, response: Response) -> ClientError {
        let status = response.status();
        let reason = self.read_error_body(response).await;

        if status == StatusCode::NOT_FOUND {
            ClientError::NotFound(reason)
        } else {
            ClientError::rejected(status.as_u16(), reason)
        }
    }

    async fn read_error_body(&self, response: Response) -> String {
        let text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => body.error,
            Err(_) if !text.is_empty() => text,
            Err(_) => "no error detail provided".to_string(),
        }
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> ClientResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = ClientResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(250 * 2u64.pow(attempt));
                    warn!(
                        "Backend request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ClientError::malformed("retry loop exhausted")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_url_helpers() {
        let client = JobClient::new(ClientConfig::default()).unwrap();
        assert_eq!(
            client.stream_url(&VideoId::new("out.mp4")),
            "http://localhost:5000/api/stream/video/out.mp4"
        );
        assert_eq!(
            client.absolute_url("/api/preview/a.jpg"),
            "http://localhost:5000/api/preview/a.jpg"
        );
        assert_eq!(
            client.absolute_url("https://cdn.example/a.jpg"),
            "https://cdn.example/a.jpg"
        );
    }
}
