//! Timeline interval engine.
//!
//! Stores user-defined time ranges with an associated filter and resolves
//! which filters are active at a playback instant. Active filters are
//! composed client-side during playback, independent of any backend job.

pub mod engine;

pub use engine::{IntervalId, TimelineEngine, TimelineInterval};
