//! Editing session controller.
//!
//! Orchestrates the backend client, the progress stream, the timeline engine
//! and the persistence port: owns the single live job per session, mediates
//! user actions (upload, start, cancel, reprocess, timeline edits) and
//! exposes a unified snapshot to presentation layers.

pub mod controller;
pub mod error;

pub use controller::{SessionController, SessionPhase, SessionSnapshot};
pub use error::{SessionError, SessionResult};
