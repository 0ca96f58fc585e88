//! Backend request/response types.

use serde::{Deserialize, Serialize};
use vedit_models::{
    ApplyRegion, BoundaryRefinement, FilterKind, JobId, JobStatus, NoPersonPolicy,
    ProcessingOptions, ProgressSnapshot, VideoId,
};

/// Response from `POST /api/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub video_id: VideoId,
    pub original_filename: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Request body for `POST /api/process/start`.
#[derive(Debug, Clone, Serialize)]
pub struct StartJobRequest {
    pub video_id: VideoId,
    pub filter_type: FilterKind,
    pub apply_to: ApplyRegion,
    pub no_person_behavior: NoPersonPolicy,
    pub confidence_threshold: f32,
    pub use_sam: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_aware: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi_expansion: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary_refinement: Option<BoundaryRefinement>,
}

impl StartJobRequest {
    /// Build a request from the user's processing options.
    pub fn from_options(video_id: VideoId, options: &ProcessingOptions) -> Self {
        Self {
            video_id,
            filter_type: options.filter,
            apply_to: options.region,
            no_person_behavior: options.no_person_policy,
            confidence_threshold: options.confidence_threshold,
            use_sam: options.high_quality_segmentation,
            region_aware: options.region_aware,
            roi_expansion: options.roi_expansion,
            boundary_refinement: options.boundary_refinement,
        }
    }
}

/// Success envelope of `POST /api/process/start`.
///
/// `job_id` stays optional here so a contract violation surfaces as a typed
/// error instead of a decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct StartJobResponse {
    #[serde(default)]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response from `GET /api/jobs/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusPayload {
    pub id: JobId,
    pub status: JobStatus,
    pub video_id: VideoId,
    #[serde(default)]
    pub progress: Option<ProgressSnapshot>,
    #[serde(default)]
    pub segments: Vec<u32>,
    #[serde(default)]
    pub output_video_id: Option<VideoId>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub stream_url: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub stats: Option<serde_json::Value>,
}

/// Request body for `POST /api/extract-filter-previews`.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewRequest {
    pub video_id: VideoId,
    pub confidence_threshold: f32,
    pub apply_to: ApplyRegion,
}

/// One per-filter preview entry.
///
/// Preview generation is per-filter, so an entry may carry its own `error`
/// even when the overall call succeeded.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterPreview {
    pub filter_id: String,
    #[serde(rename = "filter_name")]
    pub label: String,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FilterPreview {
    pub fn is_available(&self) -> bool {
        self.error.is_none() && self.preview_url.is_some()
    }
}

/// Response from `POST /api/extract-filter-previews`.
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewResponse {
    pub previews: Vec<FilterPreview>,
    #[serde(default)]
    pub frame_size: Option<FrameSize>,
}

/// Dimensions of the frame previews were generated from.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// Error envelope used by every backend endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_request_wire_shape() {
        let request = StartJobRequest::from_options(
            VideoId::new("abc.mp4"),
            &ProcessingOptions::default(),
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["video_id"], "abc.mp4");
        assert_eq!(json["filter_type"], "grayscale");
        assert_eq!(json["apply_to"], "background");
        assert_eq!(json["no_person_behavior"], "keep_original");
        assert_eq!(json["use_sam"], false);
        // Optional tuning fields stay off the wire unless set.
        assert!(json.get("region_aware").is_none());
    }

    #[test]
    fn test_status_payload_decodes_partial_body() {
        let json = r#"{
            "id": "job-1",
            "status": "processing",
            "video_id": "abc.mp4",
            "progress": {"current": 5, "total": 50, "percentage": 10.0, "fps": 12.0, "eta_seconds": 3.75},
            "output_video_id": "processed_job-1.mp4",
            "error": null,
            "created_at": "2025-06-01T10:00:00"
        }"#;
        let payload: JobStatusPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.status, JobStatus::Running);
        assert!(payload.stream_url.is_none());
        assert_eq!(payload.progress.unwrap().frames_done, 5);
    }

    #[test]
    fn test_preview_entry_partial_failure() {
        let json = r#"{"previews": [
            {"filter_id": "grayscale", "filter_name": "Grayscale", "preview_url": "/api/preview/a.jpg"},
            {"filter_id": "blur", "filter_name": "Blur", "error": "inference failed"}
        ]}"#;
        let response: PreviewResponse = serde_json::from_str(json).unwrap();
        assert!(response.previews[0].is_available());
        assert!(!response.previews[1].is_available());
    }
}
