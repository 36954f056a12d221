//! Key-value persistence for timer state
//!
//! The engine only sees the [`KeyValueStore`] capability. Every payload is
//! wrapped in a versioned [`Envelope`] so a schema change can be detected and
//! discarded instead of misread.

pub mod file;
pub mod memory;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StoreError;

pub use file::FileStore;
pub use memory::MemoryStore;

pub const TIMER_DATA_KEY: &str = "flowmodoro-timer-data";
pub const TIMER_STATS_KEY: &str = "flowmodoro-timer-stats";
pub const TIMER_CONFIG_KEY: &str = "flowmodoro-timer-config";
pub const THEME_KEY: &str = "flowmodoro-theme";

/// Version written into every envelope
pub const SCHEMA_VERSION: u32 = 1;

/// Get/set of JSON values by key
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Versioned wrapper around a stored payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub version: u32,
    /// Milliseconds since the epoch when the record was written
    pub saved_at: u64,
    pub data: T,
}

/// Serialize `value` into an envelope and store it under `key`
pub fn save_record<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
    now_ms: u64,
) -> Result<(), StoreError> {
    let envelope = Envelope {
        version: SCHEMA_VERSION,
        saved_at: now_ms,
        data: value,
    };
    store.set(key, serde_json::to_value(&envelope)?)
}

/// Read the record stored under `key`
///
/// Absent keys, store failures, undecodable payloads and foreign schema
/// versions all come back as `None`; every case but the first is logged.
pub fn load_record<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let value = match store.get(key) {
        Ok(Some(value)) => value,
        Ok(None) => {
            debug!("No stored value for {}", key);
            return None;
        }
        Err(e) => {
            warn!("Failed to read {}: {}", key, e);
            return None;
        }
    };

    match serde_json::from_value::<Envelope<T>>(value) {
        Ok(envelope) if envelope.version == SCHEMA_VERSION => Some(envelope.data),
        Ok(envelope) => {
            warn!(
                "Discarding {}: schema version {} (expected {})",
                key, envelope.version, SCHEMA_VERSION
            );
            None
        }
        Err(e) => {
            warn!("Discarding corrupt {}: {}", key, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        count: u32,
    }

    #[test]
    fn test_save_wraps_in_envelope() {
        let store = MemoryStore::new();
        save_record(&store, "sample", &Sample { count: 3 }, 42).unwrap();

        let raw = store.get("sample").unwrap().unwrap();
        assert_eq!(raw, json!({"version": 1, "savedAt": 42, "data": {"count": 3}}));
        assert_eq!(load_record::<Sample>(&store, "sample"), Some(Sample { count: 3 }));
    }

    #[test]
    fn test_load_missing_key() {
        let store = MemoryStore::new();
        assert_eq!(load_record::<Sample>(&store, "sample"), None);
    }

    #[test]
    fn test_load_rejects_other_version() {
        let store = MemoryStore::new();
        store
            .set("sample", json!({"version": 2, "savedAt": 0, "data": {"count": 1}}))
            .unwrap();
        assert_eq!(load_record::<Sample>(&store, "sample"), None);
    }

    #[test]
    fn test_load_rejects_unwrapped_payload() {
        let store = MemoryStore::new();
        store.set("sample", json!({"count": 1})).unwrap();
        assert_eq!(load_record::<Sample>(&store, "sample"), None);
    }
}
