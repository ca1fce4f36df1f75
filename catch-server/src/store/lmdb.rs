//! LMDB Backend - embedded durable storage for player documents
//!
//! One named LMDB database per collection, keyed by document id, holding the
//! document as JSON bytes. Upserts read-merge-write inside a single write
//! transaction, so a patch is applied atomically on disk.
//!
//! ## Performance
//! - Upsert: one write transaction (fsync on commit)
//! - load_all: one cursor pass over memory-mapped pages

use async_trait::async_trait;
use heed::{Database, Env, EnvOpenOptions};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::backend::{
    merge_patch, BackendError, BackendResult, DocumentPatch, DurableBackend, PLAYERS_COLLECTION,
};

type DocumentDb = Database<heed::types::Str, heed::types::Bytes>;

/// Named databases: players plus the guild collection kept for compatibility
const MAX_COLLECTIONS: u32 = 8;

pub struct LmdbBackend {
    env: Arc<Env>,
    databases: RwLock<HashMap<String, DocumentDb>>,
}

impl LmdbBackend {
    /// Open or create the document store
    ///
    /// # Arguments
    /// * `path` - Directory for LMDB data files
    /// * `max_size` - Maximum map size in bytes
    pub fn new<P: AsRef<Path>>(path: P, max_size: usize) -> BackendResult<Self> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size)
                .max_dbs(MAX_COLLECTIONS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let players = env.create_database::<heed::types::Str, heed::types::Bytes>(&mut wtxn, Some(PLAYERS_COLLECTION))?;
        wtxn.commit()?;

        info!("LMDB document store initialized ({}MB)", max_size / (1024 * 1024));

        let mut databases = HashMap::new();
        databases.insert(PLAYERS_COLLECTION.to_string(), players);

        Ok(Self {
            env: Arc::new(env),
            databases: RwLock::new(databases),
        })
    }

    fn database(&self, collection: &str) -> BackendResult<DocumentDb> {
        if let Some(db) = self.databases.read().get(collection) {
            return Ok(*db);
        }

        let mut wtxn = self.env.write_txn()?;
        let db = self
            .env
            .create_database::<heed::types::Str, heed::types::Bytes>(&mut wtxn, Some(collection))?;
        wtxn.commit()?;
        debug!("Created LMDB database for collection {}", collection);

        self.databases.write().insert(collection.to_string(), db);
        Ok(db)
    }

    /// Read-merge-write of one document in a single transaction
    pub fn upsert_sync(&self, collection: &str, key: &str, patch: &DocumentPatch) -> BackendResult<()> {
        let db = self.database(collection)?;
        let mut wtxn = self.env.write_txn()?;

        let mut doc: Map<String, Value> = match db.get(&wtxn, key)? {
            Some(bytes) => match serde_json::from_slice(bytes)? {
                Value::Object(map) => map,
                _ => {
                    return Err(BackendError::NotAnObject {
                        collection: collection.to_string(),
                        key: key.to_string(),
                    })
                }
            },
            None => Map::new(),
        };
        merge_patch(&mut doc, patch);

        let bytes = serde_json::to_vec(&doc)?;
        db.put(&mut wtxn, key, &bytes)?;
        wtxn.commit()?;
        Ok(())
    }

    pub fn load_all_sync(&self, collection: &str) -> BackendResult<Vec<(String, Value)>> {
        let db = self.database(collection)?;
        let rtxn = self.env.read_txn()?;
        let mut docs = Vec::new();
        for entry in db.iter(&rtxn)? {
            let (key, bytes) = entry?;
            docs.push((key.to_string(), serde_json::from_slice(bytes)?));
        }
        Ok(docs)
    }

    /// Raw durable copy of one document
    pub fn get(&self, collection: &str, key: &str) -> BackendResult<Option<Value>> {
        let db = self.database(collection)?;
        let rtxn = self.env.read_txn()?;
        match db.get(&rtxn, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(bytes)?)),
            None => Ok(None),
        }
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> BackendResult<u64> {
        let db = self.database(collection)?;
        let rtxn = self.env.read_txn()?;
        Ok(db.len(&rtxn)?)
    }
}

#[async_trait]
impl DurableBackend for LmdbBackend {
    fn name(&self) -> &'static str {
        "lmdb"
    }

    async fn upsert(&self, collection: &str, key: &str, patch: &DocumentPatch) -> BackendResult<()> {
        self.upsert_sync(collection, key, patch)
    }

    async fn load_all(&self, collection: &str) -> BackendResult<Vec<(String, Value)>> {
        self.load_all_sync(collection)
    }
}
