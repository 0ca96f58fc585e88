//! Session persistence boundary.
//!
//! This crate provides:
//! - The [`SessionStore`] port: durable string key-value state
//! - An in-memory backend for tests and ephemeral sessions
//! - A JSON-file backend for desktop sessions
//! - A typed [`StateCache`] wrapper with the well-known session keys
//!
//! Stored state is a best-effort cache: every value is safe to lose, and a
//! corrupt value is treated as absent.

pub mod cache;
pub mod error;
pub mod file;
pub mod memory;
pub mod port;

pub use cache::{StateCache, OUTPUT_KEY, TIMELINE_KEY, VIDEO_KEY};
pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use port::SessionStore;
