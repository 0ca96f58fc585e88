//! Shared data models for the Vedit editing session.
//!
//! This crate provides Serde-serializable types for:
//! - Video assets and identifiers
//! - Processing jobs, options and status
//! - Progress snapshots
//! - Progress-stream message schemas

pub mod event;
pub mod filter;
pub mod job;
pub mod progress;
pub mod video;

// Re-export common types
pub use event::StreamMessage;
pub use filter::{ApplyRegion, FilterKind, NoPersonPolicy};
pub use job::{BoundaryRefinement, Job, JobId, JobStatus, ProcessingOptions};
pub use progress::ProgressSnapshot;
pub use video::{MediaInfo, Resolution, VideoId, VideoRef};
