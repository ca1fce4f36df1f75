//! Durable backend seam - the replication target of the player store
//!
//! The store only needs two operations from durable storage:
//! - `upsert`: merge a partial document (changed top-level fields) into the
//!   document stored under `(collection, key)`, creating it when absent
//! - `load_all`: read every document of a collection, once, at startup
//!
//! Backends: [`MemoryBackend`](super::memory::MemoryBackend) (tests),
//! [`LmdbBackend`](super::lmdb::LmdbBackend) (embedded) and
//! [`PostgresBackend`](super::postgres::PostgresBackend).

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Collection holding one document per player
pub const PLAYERS_COLLECTION: &str = "players";

/// Top-level field patch; keys are the camelCase document field names
pub type DocumentPatch = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Stored document {key} in {collection} is not a JSON object")]
    NotAnObject { collection: String, key: String },
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

#[async_trait]
pub trait DurableBackend: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Merge `patch` into the stored document, creating it if missing
    async fn upsert(&self, collection: &str, key: &str, patch: &DocumentPatch) -> BackendResult<()>;

    /// Every `(key, document)` pair in a collection
    async fn load_all(&self, collection: &str) -> BackendResult<Vec<(String, Value)>>;
}

/// Shallow merge used by the key-value backends: top-level fields in `patch`
/// replace the stored ones.
pub fn merge_patch(target: &mut Map<String, Value>, patch: &DocumentPatch) {
    for (field, value) in patch {
        target.insert(field.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_patch_replaces_only_named_fields() {
        let mut stored = json!({"currency": 5, "level": 3}).as_object().cloned().unwrap();
        let patch = json!({"currency": 30}).as_object().cloned().unwrap();
        merge_patch(&mut stored, &patch);
        assert_eq!(stored["currency"], 30);
        assert_eq!(stored["level"], 3, "untouched field must survive");
    }
}
