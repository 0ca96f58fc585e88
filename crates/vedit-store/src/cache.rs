//! Typed access to the well-known session keys.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::StoreResult;
use crate::port::SessionStore;

/// Key holding the current video reference (JSON).
pub const VIDEO_KEY: &str = "vedit:video";
/// Key holding the current timeline interval list (JSON).
pub const TIMELINE_KEY: &str = "vedit:timeline";
/// Key holding the last completed output reference (JSON).
pub const OUTPUT_KEY: &str = "vedit:output";

/// JSON (de)serialization layer over a [`SessionStore`].
///
/// Values are best-effort caches: a value that no longer parses is reported
/// as absent, not as an error, so a schema change can never wedge a session.
#[derive(Clone)]
pub struct StateCache {
    store: Arc<dyn SessionStore>,
}

impl StateCache {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Load and decode a value; corrupt entries count as absent.
    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let Some(raw) = self.store.load(key)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable cached value");
                Ok(None)
            }
        }
    }

    /// Encode and store a value.
    pub fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let raw = serde_json::to_string(value)?;
        self.store.save(key, &raw)
    }

    /// Delete a value.
    pub fn remove(&self, key: &str) -> StoreResult<()> {
        self.store.remove(key)
    }
}
