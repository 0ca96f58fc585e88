//! Backend HTTP client.
//!
//! A stateless, typed request/response wrapper over the processing backend:
//! upload, job start/status/cancel and filter preview extraction.

pub mod client;
pub mod error;
pub mod types;

pub use client::{ClientConfig, JobClient};
pub use error::{ClientError, ClientResult};
pub use types::{
    FilterPreview, FrameSize, JobStatusPayload, PreviewRequest, PreviewResponse, StartJobRequest,
    StartJobResponse, UploadResponse,
};
