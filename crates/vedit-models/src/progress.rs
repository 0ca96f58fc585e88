//! Progress snapshot model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Point-in-time progress of a processing job.
///
/// A snapshot is replaced wholesale on each stream event; fields are never
/// merged across events, so a later event fully supersedes an earlier one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProgressSnapshot {
    /// Frames processed so far
    #[serde(rename = "current")]
    pub frames_done: u64,

    /// Total frames in the source
    #[serde(rename = "total")]
    pub frames_total: u64,

    /// Completion percentage (0-100) as reported by the backend
    #[serde(default)]
    pub percentage: f64,

    /// Processing throughput in frames per second
    #[serde(default, rename = "fps")]
    pub frames_per_second: f64,

    /// Estimated seconds remaining
    #[serde(default)]
    pub eta_seconds: f64,

    /// Preview frame of the in-progress output, when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

impl ProgressSnapshot {
    /// Completion percentage, derived from frame counts when the backend
    /// omitted the field.
    pub fn percent(&self) -> f64 {
        if self.percentage > 0.0 {
            self.percentage
        } else if self.frames_total > 0 {
            self.frames_done as f64 / self.frames_total as f64 * 100.0
        } else {
            0.0
        }
    }
}
