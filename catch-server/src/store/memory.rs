//! In-process backend for tests and the `memory` server mode.
//!
//! Survives store restarts as long as the same `Arc<MemoryBackend>` is handed
//! to the next `PlayerStore::hydrate`. Upsert failures can be injected to
//! exercise the writer's retry path.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use super::backend::{merge_patch, BackendError, BackendResult, DocumentPatch, DurableBackend};

#[derive(Default)]
pub struct MemoryBackend {
    collections: Mutex<HashMap<String, BTreeMap<String, Map<String, Value>>>>,
    fail_upserts: AtomicU32,
    upserts: AtomicU64,
    load_calls: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` upserts fail with `Unavailable`
    pub fn fail_next_upserts(&self, count: u32) {
        self.fail_upserts.store(count, Ordering::SeqCst);
    }

    /// Successful upserts so far
    pub fn upsert_count(&self) -> u64 {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn load_count(&self) -> u64 {
        self.load_calls.load(Ordering::SeqCst)
    }

    /// Current durable copy of one document
    pub fn document(&self, collection: &str, key: &str) -> Option<Value> {
        self.collections
            .lock()
            .get(collection)
            .and_then(|docs| docs.get(key))
            .map(|doc| Value::Object(doc.clone()))
    }

    /// Store a raw value as if it had been written earlier
    pub fn insert_raw(&self, collection: &str, key: &str, doc: Map<String, Value>) {
        self.collections
            .lock()
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), doc);
    }

    fn take_injected_failure(&self) -> bool {
        self.fail_upserts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl DurableBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn upsert(&self, collection: &str, key: &str, patch: &DocumentPatch) -> BackendResult<()> {
        if self.take_injected_failure() {
            return Err(BackendError::Unavailable("injected upsert failure".into()));
        }
        let mut collections = self.collections.lock();
        let doc = collections
            .entry(collection.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default();
        merge_patch(doc, patch);
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_all(&self, collection: &str) -> BackendResult<Vec<(String, Value)>> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .collections
            .lock()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(key, doc)| (key.clone(), Value::Object(doc.clone())))
                    .collect()
            })
            .unwrap_or_default())
    }
}
