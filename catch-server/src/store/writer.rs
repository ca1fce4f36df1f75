//! Write-behind persistence queue
//!
//! ## Architecture
//! ```text
//! [PlayerStore::mutate]  (holds the player lock)
//!       ↓ enqueue patch (commit order)
//! [unbounded mpsc]
//!       ↓
//! [writer task] → backend.upsert ── Err → warn!, back off, retry
//!       │                                   └─ exhausted → error!, drop
//!       └─ Flush(oneshot) → ack once every earlier write is done
//! ```
//! A single task drains the queue, so writes reach the backend in exactly the
//! order they were committed in memory. Failed writes never roll back memory;
//! the document is marked stale instead, and the store's next commit for it
//! sends every field rather than a diff.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::backend::{DocumentPatch, DurableBackend};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    /// Retries after the first failed attempt
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff_ms: 50,
            max_backoff_ms: 5_000,
        }
    }
}

enum WriteCommand {
    Upsert {
        collection: &'static str,
        key: String,
        patch: DocumentPatch,
    },
    Flush(oneshot::Sender<()>),
}

#[derive(Default)]
struct WriterCounters {
    enqueued: AtomicU64,
    written: AtomicU64,
    retries: AtomicU64,
    dropped: AtomicU64,
    /// Documents with an abandoned write, as (collection, key)
    stale: Mutex<HashSet<(&'static str, String)>>,
}

impl WriterCounters {
    fn mark_stale(&self, collection: &'static str, key: String) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        self.stale.lock().insert((collection, key));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriterStats {
    pub enqueued: u64,
    pub written: u64,
    pub retries: u64,
    /// Writes abandoned after exhausting retries
    pub dropped: u64,
}

#[derive(Clone)]
pub struct PersistWriter {
    tx: mpsc::UnboundedSender<WriteCommand>,
    counters: Arc<WriterCounters>,
}

impl PersistWriter {
    /// Spawn the writer task on the current tokio runtime
    pub fn spawn(backend: Arc<dyn DurableBackend>, config: PersistConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(WriterCounters::default());

        info!(
            "Persistence writer started (backend={}, max_retries={})",
            backend.name(),
            config.max_retries
        );

        let worker_counters = counters.clone();
        tokio::spawn(async move {
            Self::worker_loop(rx, backend, config, worker_counters).await;
        });

        Self { tx, counters }
    }

    /// Queue one patch; never blocks
    pub fn enqueue(&self, collection: &'static str, key: String, patch: DocumentPatch) {
        if patch.is_empty() {
            return;
        }
        self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
        if let Err(mpsc::error::SendError(WriteCommand::Upsert { key, .. })) =
            self.tx.send(WriteCommand::Upsert { collection, key, patch })
        {
            error!("Persistence writer is gone; write to {}/{} dropped", collection, key);
            self.counters.mark_stale(collection, key);
        }
    }

    /// Whether a write for this document was abandoned since the last call;
    /// clears the mark
    pub fn take_stale(&self, collection: &'static str, key: &str) -> bool {
        let mut stale = self.counters.stale.lock();
        if stale.is_empty() {
            return false;
        }
        stale.remove(&(collection, key.to_string()))
    }

    /// Wait until every write queued before this call has been attempted
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(WriteCommand::Flush(ack_tx)).is_err() {
            warn!("Flush requested after the persistence writer stopped");
            return;
        }
        let _ = ack_rx.await;
    }

    pub fn stats(&self) -> WriterStats {
        WriterStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            written: self.counters.written.load(Ordering::Relaxed),
            retries: self.counters.retries.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    async fn worker_loop(
        mut rx: mpsc::UnboundedReceiver<WriteCommand>,
        backend: Arc<dyn DurableBackend>,
        config: PersistConfig,
        counters: Arc<WriterCounters>,
    ) {
        while let Some(command) = rx.recv().await {
            match command {
                WriteCommand::Upsert { collection, key, patch } => {
                    Self::write_with_retry(backend.as_ref(), &config, &counters, collection, &key, &patch).await;
                }
                WriteCommand::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }
        debug!("Persistence writer queue closed");
    }

    async fn write_with_retry(
        backend: &dyn DurableBackend,
        config: &PersistConfig,
        counters: &WriterCounters,
        collection: &'static str,
        key: &str,
        patch: &DocumentPatch,
    ) {
        let mut backoff = Duration::from_millis(config.initial_backoff_ms);
        let max_backoff = Duration::from_millis(config.max_backoff_ms.max(config.initial_backoff_ms));
        let mut attempt = 0u32;

        loop {
            match backend.upsert(collection, key, patch).await {
                Ok(()) => {
                    counters.written.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                Err(e) if attempt < config.max_retries => {
                    attempt += 1;
                    counters.retries.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        "Upsert {}/{} failed (attempt {}/{}): {}; retrying in {:?}",
                        collection,
                        key,
                        attempt,
                        config.max_retries + 1,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(max_backoff);
                }
                Err(e) => {
                    counters.mark_stale(collection, key.to_string());
                    let fields: Vec<&str> = patch.keys().map(String::as_str).collect();
                    error!(
                        "Upsert {}/{} abandoned after {} attempts: {} (fields {:?})",
                        collection,
                        key,
                        attempt + 1,
                        e,
                        fields
                    );
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryBackend;
    use serde_json::json;

    fn patch(value: serde_json::Value) -> DocumentPatch {
        value.as_object().cloned().unwrap()
    }

    fn fast_config(max_retries: u32) -> PersistConfig {
        PersistConfig {
            max_retries,
            initial_backoff_ms: 1,
            max_backoff_ms: 4,
        }
    }

    #[tokio::test]
    async fn test_writes_land_in_order() {
        let backend = Arc::new(MemoryBackend::new());
        let writer = PersistWriter::spawn(backend.clone(), fast_config(0));

        for i in 0..50u64 {
            writer.enqueue("players", "p".into(), patch(json!({ "currency": i })));
        }
        writer.flush().await;

        assert_eq!(backend.document("players", "p").unwrap()["currency"], 49, "last write wins");
        assert_eq!(writer.stats().written, 50);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_next_upserts(2);
        let writer = PersistWriter::spawn(backend.clone(), fast_config(3));

        writer.enqueue("players", "p".into(), patch(json!({ "currency": 7 })));
        writer.flush().await;

        let stats = writer.stats();
        assert_eq!(stats.retries, 2);
        assert_eq!(stats.written, 1);
        assert_eq!(stats.dropped, 0);
        assert_eq!(backend.document("players", "p").unwrap()["currency"], 7);
    }

    #[tokio::test]
    async fn test_exhausted_retries_drop_the_write() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_next_upserts(10);
        let writer = PersistWriter::spawn(backend.clone(), fast_config(1));

        writer.enqueue("players", "p".into(), patch(json!({ "currency": 7 })));
        writer.flush().await;

        assert_eq!(writer.stats().dropped, 1);
        assert!(backend.document("players", "p").is_none());
    }

    #[tokio::test]
    async fn test_abandoned_write_marks_document_stale() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_next_upserts(10);
        let writer = PersistWriter::spawn(backend.clone(), fast_config(1));

        writer.enqueue("players", "p".into(), patch(json!({ "currency": 7 })));
        writer.enqueue("players", "q".into(), DocumentPatch::new());
        writer.flush().await;

        assert!(!writer.take_stale("players", "q"), "skipped writes are not stale");
        assert!(writer.take_stale("players", "p"));
        assert!(!writer.take_stale("players", "p"), "the mark is cleared once taken");
    }

    #[tokio::test]
    async fn test_empty_patch_is_skipped() {
        let backend = Arc::new(MemoryBackend::new());
        let writer = PersistWriter::spawn(backend.clone(), fast_config(0));
        writer.enqueue("players", "p".into(), DocumentPatch::new());
        writer.flush().await;
        assert_eq!(writer.stats().enqueued, 0);
        assert_eq!(backend.upsert_count(), 0);
    }
}
