//! Progress-stream subscription.
//!
//! One single-shot server-sent-event subscription per processing job: raw
//! events are parsed incrementally, decoded into typed updates, and the
//! stream closes itself on the job's terminal status event.

pub mod error;
pub mod sse;
pub mod stream;

pub use error::{StreamError, StreamResult};
pub use sse::SseParser;
pub use stream::{ByteFeed, CloseReason, ProgressStream, StreamConfig, StreamEvent, StreamState};
