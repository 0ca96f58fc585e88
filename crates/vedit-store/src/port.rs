//! The session persistence port.

use crate::error::StoreResult;

/// Durable string key-value state surviving session reloads.
///
/// The core never touches a concrete storage mechanism directly; everything
/// goes through this port so tests can inject an in-memory fake.
pub trait SessionStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key is absent.
    fn load(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn save(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete a value; deleting an absent key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}
