//! Video asset models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Backend-assigned identifier of an uploaded or produced video file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Pixel dimensions of a video asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Playback metadata probed from a media element or container.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration_seconds: f64,
    /// Pixel dimensions
    pub resolution: Resolution,
    /// Container/codec label, e.g. "mp4"
    pub format: String,
}

impl MediaInfo {
    pub fn new(duration_seconds: f64, resolution: Resolution, format: impl Into<String>) -> Self {
        Self {
            duration_seconds,
            resolution,
            format: format.into(),
        }
    }
}

/// Reference to a source or result video asset.
///
/// Immutable once created: a new upload or a completed job produces a new
/// `VideoRef` that supersedes the previous one.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoRef {
    /// Client-assigned identity
    pub id: Uuid,

    /// Backend identifier, present once the asset exists server-side
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_id: Option<VideoId>,

    /// Name shown to the user (original filename or a derived label)
    pub display_name: String,

    /// URL the asset can be played back from
    pub source_url: String,

    /// Duration in seconds
    pub duration_seconds: f64,

    /// Pixel dimensions
    pub resolution: Resolution,

    /// Container/codec label, e.g. "mp4"
    pub format: String,

    /// Size in bytes, zero when unknown
    pub byte_size: u64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl VideoRef {
    /// Create a new reference with a fresh client identity.
    pub fn new(display_name: impl Into<String>, source_url: impl Into<String>, info: MediaInfo) -> Self {
        Self {
            id: Uuid::new_v4(),
            backend_id: None,
            display_name: display_name.into(),
            source_url: source_url.into(),
            duration_seconds: info.duration_seconds,
            resolution: info.resolution,
            format: info.format,
            byte_size: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_backend_id(mut self, id: VideoId) -> Self {
        self.backend_id = Some(id);
        self
    }

    pub fn with_byte_size(mut self, bytes: u64) -> Self {
        self.byte_size = bytes;
        self
    }
}
