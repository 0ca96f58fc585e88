//! Progress-stream message types.
//!
//! Each server-sent event carries a JSON envelope `{type, data}`; these types
//! mirror that wire shape.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::JobStatus;
use crate::progress::ProgressSnapshot;
use crate::video::VideoId;

/// Progress-stream message envelope.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamMessage {
    /// Incremental progress update
    Progress(ProgressSnapshot),

    /// Job status change; terminal for complete/failed/cancelled
    Status {
        status: JobStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// The in-progress output became playable
    StreamReady {
        stream_url: String,
        output_video_id: VideoId,
    },
}

impl StreamMessage {
    /// Create a status message.
    pub fn status(status: JobStatus) -> Self {
        StreamMessage::Status { status, error: None }
    }

    /// Create a status message carrying an error description.
    pub fn status_with_error(status: JobStatus, error: impl Into<String>) -> Self {
        StreamMessage::Status {
            status,
            error: Some(error.into()),
        }
    }

    /// Whether this message ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamMessage::Status { status, .. } if status.is_terminal())
    }
}
