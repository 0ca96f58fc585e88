//! Processing job models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

use crate::filter::{ApplyRegion, FilterKind, NoPersonPolicy};
use crate::video::VideoRef;

/// Backend-assigned identifier of a processing job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle status of a processing job.
///
/// Wire names follow the backend (`queued`, `processing`); the variant names
/// follow the session vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted by the backend, not yet running
    #[serde(rename = "queued", alias = "pending")]
    Pending,
    /// Frames are being processed
    #[serde(rename = "processing", alias = "running")]
    Running,
    /// Finished successfully, output available
    Complete,
    /// Finished with an error
    Failed,
    /// Stopped before completion
    Cancelled,
}

impl JobStatus {
    pub const ALL: &'static [JobStatus] = &[
        JobStatus::Pending,
        JobStatus::Running,
        JobStatus::Complete,
        JobStatus::Failed,
        JobStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "queued",
            JobStatus::Running => "processing",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the job can still make progress.
    pub fn is_live(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    /// Whether the job has reached a final state.
    pub fn is_terminal(&self) -> bool {
        !self.is_live()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = JobStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queued" | "pending" => Ok(JobStatus::Pending),
            "processing" | "running" => Ok(JobStatus::Running),
            "complete" => Ok(JobStatus::Complete),
            "failed" => Ok(JobStatus::Failed),
            "cancelled" => Ok(JobStatus::Cancelled),
            _ => Err(JobStatusParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown job status: {0}")]
pub struct JobStatusParseError(String);

/// Segmentation boundary refinement level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryRefinement {
    Minimal,
    #[default]
    Balanced,
    Aggressive,
}

impl BoundaryRefinement {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryRefinement::Minimal => "minimal",
            BoundaryRefinement::Balanced => "balanced",
            BoundaryRefinement::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for BoundaryRefinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User-selected options for one processing run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct ProcessingOptions {
    /// Filter to apply
    pub filter: FilterKind,

    /// Where the filter is applied
    pub region: ApplyRegion,

    /// Behavior for frames without a detected person
    pub no_person_policy: NoPersonPolicy,

    /// Detection confidence threshold (0.0-1.0)
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence_threshold: f32,

    /// Enable high-quality (SAM) boundary segmentation
    pub high_quality_segmentation: bool,

    /// Only process the region where a person appears
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_aware: Option<bool>,

    /// Region expansion factor (0.0-1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub roi_expansion: Option<f32>,

    /// Boundary refinement level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary_refinement: Option<BoundaryRefinement>,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            filter: FilterKind::Grayscale,
            region: ApplyRegion::Background,
            no_person_policy: NoPersonPolicy::KeepOriginal,
            confidence_threshold: 0.5,
            high_quality_segmentation: false,
            region_aware: None,
            roi_expansion: None,
            boundary_refinement: None,
        }
    }
}

impl ProcessingOptions {
    pub fn new(filter: FilterKind, region: ApplyRegion) -> Self {
        Self {
            filter,
            region,
            ..Self::default()
        }
    }

    pub fn with_confidence(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_high_quality_segmentation(mut self, enabled: bool) -> Self {
        self.high_quality_segmentation = enabled;
        self
    }
}

/// One backend-side invocation of the transformation pipeline.
///
/// At most one job may be live (pending/running) per session.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Backend job identifier
    pub job_id: JobId,

    /// Source asset the job was started for
    pub video: VideoRef,

    /// Options the job was started with
    pub options: ProcessingOptions,

    /// Last known status
    pub status: JobStatus,
}

impl Job {
    /// Create a freshly started job.
    pub fn new(job_id: JobId, video: VideoRef, options: ProcessingOptions) -> Self {
        Self {
            job_id,
            video,
            options,
            status: JobStatus::Pending,
        }
    }

    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }
}
