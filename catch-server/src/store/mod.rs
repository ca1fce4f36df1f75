//! Player State Store - authoritative in-memory cache with write-through persistence
//!
//! ## Architecture
//! ```text
//! read_*(player) ──> [RwLock<HashMap<PlayerId, Arc<Mutex<PlayerDocument>>>>]
//!                                    │
//! mutate(player, f) ─ lock player ───┤ clone ─> f(&mut draft) ─ Ok ─> swap in
//!                                    │                                  │
//!                                    │                  diff fields ────┘
//!                                    v                       │
//!                              (lock released)        [PersistWriter] ──> DurableBackend
//! ```
//!
//! - Reads and mutations are synchronous and never touch durable storage.
//! - A mutation is committed in memory before it returns; the patch of changed
//!   top-level fields is queued for the writer while the player lock is held,
//!   so durable writes follow commit order.
//! - A failed mutation (closure returned `Err`) leaves the document untouched.
//! - After a durable write is abandoned, the player's next commit persists the
//!   full document instead of a diff.
//! - Locks are per player; different players never contend beyond the brief
//!   map lookup.
//! - The only constructor is [`PlayerStore::hydrate`], so a store that exists
//!   is always fully loaded.

pub mod backend;
pub mod economy;
pub mod lmdb;
pub mod memory;
pub mod migrations;
pub mod postgres;
pub mod writer;

use parking_lot::{Mutex, RwLock};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

use catch_core::player::{Incubation, TankEntry};
use catch_core::progression::{apply_experience, LevelUp};
use catch_core::{Catalog, CatchObject, CatchRoll, Modifiers, PipelineConfig, PlayerDocument};

use crate::catch::CatchError;
use backend::{BackendError, DocumentPatch, DurableBackend, PLAYERS_COLLECTION};
use writer::{PersistConfig, PersistWriter, WriterStats};

pub use economy::EconomyError;

// ============================================================================
// Identity & errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for PlayerId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to hydrate collection `{collection}`: {source}")]
    Hydration {
        collection: &'static str,
        #[source]
        source: BackendError,
    },
    #[error("stored document for player {key} is corrupt: {source}")]
    CorruptDocument {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// A two-player mutation was asked to lock the same player twice
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("player {0} given as both sides of a paired mutation")]
pub struct SamePlayer(pub PlayerId);

/// Result of one applied catch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedCatch {
    pub catch: CatchObject,
    pub secondary_reward: u64,
    pub experience_gained: u64,
    pub level_up: LevelUp,
    pub dropped_accessory: Option<String>,
    pub currency_after: u64,
}

// ============================================================================
// Store
// ============================================================================

type PlayerSlot = Arc<Mutex<PlayerDocument>>;

pub struct PlayerStore {
    players: RwLock<HashMap<PlayerId, PlayerSlot>>,
    catalog: Arc<Catalog>,
    config: Arc<PipelineConfig>,
    writer: PersistWriter,
}

impl PlayerStore {
    /// Load every player document once, then start the persistence writer.
    ///
    /// Any backend failure or undecodable document aborts startup: serving
    /// defaults here would later overwrite real data.
    pub async fn hydrate(
        backend: Arc<dyn DurableBackend>,
        catalog: Arc<Catalog>,
        config: Arc<PipelineConfig>,
        persist: PersistConfig,
    ) -> Result<Self, StoreError> {
        let raw = backend
            .load_all(PLAYERS_COLLECTION)
            .await
            .map_err(|source| StoreError::Hydration {
                collection: PLAYERS_COLLECTION,
                source,
            })?;

        let mut players = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            let doc: PlayerDocument = serde_json::from_value(value)
                .map_err(|source| StoreError::CorruptDocument { key: key.clone(), source })?;
            players.insert(PlayerId(key), Arc::new(Mutex::new(doc)));
        }

        info!(
            "Hydrated {} player documents from {} ({})",
            players.len(),
            backend.name(),
            PLAYERS_COLLECTION
        );

        let writer = PersistWriter::spawn(backend, persist);
        Ok(Self {
            players: RwLock::new(players),
            catalog,
            config,
            writer,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Number of resident player documents
    pub fn len(&self) -> usize {
        self.players.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.read().is_empty()
    }

    pub fn contains(&self, player: &PlayerId) -> bool {
        self.players.read().contains_key(player)
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.read().keys().cloned().collect()
    }

    /// Wait for every queued durable write to be attempted
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    pub fn writer_stats(&self) -> WriterStats {
        self.writer.stats()
    }

    /// Slot for a player, materializing (and persisting) a default document
    /// on first touch
    fn slot(&self, player: &PlayerId) -> PlayerSlot {
        if let Some(slot) = self.players.read().get(player) {
            return slot.clone();
        }

        let mut players = self.players.write();
        if let Some(slot) = players.get(player) {
            return slot.clone();
        }

        let doc = PlayerDocument::default();
        match document_fields(&doc) {
            Ok(fields) => self.writer.enqueue(PLAYERS_COLLECTION, player.to_string(), fields),
            Err(e) => error!("Could not encode default document for {}: {}", player, e),
        }
        debug!("Created default document for player {}", player);

        let slot = Arc::new(Mutex::new(doc));
        players.insert(player.clone(), slot.clone());
        slot
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Run `f` against the current document
    pub fn read<T>(&self, player: &PlayerId, f: impl FnOnce(&PlayerDocument) -> T) -> T {
        let slot = self.slot(player);
        let doc = slot.lock();
        f(&doc)
    }

    /// Full copy of the current document
    pub fn snapshot(&self, player: &PlayerId) -> PlayerDocument {
        self.read(player, PlayerDocument::clone)
    }

    pub fn read_currency(&self, player: &PlayerId) -> u64 {
        self.read(player, |d| d.currency)
    }

    pub fn read_premium_currency(&self, player: &PlayerId) -> u64 {
        self.read(player, |d| d.premium_currency)
    }

    pub fn read_experience(&self, player: &PlayerId) -> u64 {
        self.read(player, |d| d.experience)
    }

    pub fn read_level(&self, player: &PlayerId) -> u32 {
        self.read(player, |d| d.level)
    }

    pub fn read_tool_level(&self, player: &PlayerId) -> u32 {
        self.read(player, |d| d.tool_level)
    }

    pub fn read_max_tool_level_owned(&self, player: &PlayerId) -> u32 {
        self.read(player, |d| d.max_tool_level_owned)
    }

    pub fn read_equipped_accessories(&self, player: &PlayerId) -> Vec<String> {
        self.read(player, |d| d.equipped_accessories.clone())
    }

    pub fn read_owned_accessories(&self, player: &PlayerId) -> BTreeMap<String, u32> {
        self.read(player, |d| d.owned_accessories.clone())
    }

    pub fn read_companions_owned(&self, player: &PlayerId) -> Vec<String> {
        self.read(player, |d| d.companions_owned.clone())
    }

    pub fn read_active_companions(&self, player: &PlayerId) -> Vec<String> {
        self.read(player, |d| d.active_companions.clone())
    }

    pub fn read_pending_incubations(&self, player: &PlayerId) -> Vec<Incubation> {
        self.read(player, |d| d.pending_incubations.clone())
    }

    pub fn read_caught_objects(&self, player: &PlayerId) -> Vec<CatchObject> {
        self.read(player, |d| d.caught_objects.clone())
    }

    pub fn read_inventory_len(&self, player: &PlayerId) -> usize {
        self.read(player, |d| d.caught_objects.len())
    }

    pub fn read_display_tank(&self, player: &PlayerId) -> BTreeMap<String, TankEntry> {
        self.read(player, |d| d.display_tank.clone())
    }

    pub fn read_last_daily_claim(&self, player: &PlayerId) -> i64 {
        self.read(player, |d| d.last_daily_claim_epoch)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Apply `f` to one player's document as a single atomic step.
    ///
    /// `f` works on a draft; the draft replaces the document only if `f`
    /// returns `Ok`, so a rejected operation performs zero mutation.
    pub fn mutate<T, E>(
        &self,
        player: &PlayerId,
        f: impl FnOnce(&mut PlayerDocument) -> Result<T, E>,
    ) -> Result<T, E> {
        let slot = self.slot(player);
        let mut doc = slot.lock();
        let mut draft = doc.clone();
        let out = f(&mut draft)?;
        self.commit(player, &mut doc, draft);
        Ok(out)
    }

    /// Infallible variant of [`mutate`](Self::mutate)
    pub fn update<T>(&self, player: &PlayerId, f: impl FnOnce(&mut PlayerDocument) -> T) -> T {
        let result: Result<T, std::convert::Infallible> = self.mutate(player, |doc| Ok(f(doc)));
        match result {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Apply `f` to two distinct players atomically.
    ///
    /// Locks are taken in `PlayerId` order, so two opposing calls cannot
    /// deadlock. `f` receives the documents in argument order. Passing the
    /// same player twice fails with [`SamePlayer`] before any lock is taken.
    pub fn mutate_pair<T, E>(
        &self,
        first: &PlayerId,
        second: &PlayerId,
        f: impl FnOnce(&mut PlayerDocument, &mut PlayerDocument) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<SamePlayer>,
    {
        if first == second {
            return Err(SamePlayer(first.clone()).into());
        }
        let first_slot = self.slot(first);
        let second_slot = self.slot(second);

        let (mut first_doc, mut second_doc) = if first <= second {
            let a = first_slot.lock();
            let b = second_slot.lock();
            (a, b)
        } else {
            let b = second_slot.lock();
            let a = first_slot.lock();
            (a, b)
        };

        let mut first_draft = first_doc.clone();
        let mut second_draft = second_doc.clone();
        let out = f(&mut first_draft, &mut second_draft)?;
        self.commit(first, &mut first_doc, first_draft);
        self.commit(second, &mut second_doc, second_draft);
        Ok(out)
    }

    /// Swap the draft in and queue the changed fields; caller holds the lock.
    ///
    /// If an earlier write for this player was abandoned, the whole document
    /// is queued so durable storage catches up on the lost fields too.
    fn commit(&self, player: &PlayerId, doc: &mut PlayerDocument, draft: PlayerDocument) {
        let patch = if self.writer.take_stale(PLAYERS_COLLECTION, player.as_str()) {
            debug!("Resending full document for player {} after a dropped write", player);
            document_fields(&draft)
        } else {
            changed_fields(doc, &draft)
        };
        match patch {
            Ok(patch) => self.writer.enqueue(PLAYERS_COLLECTION, player.to_string(), patch),
            Err(e) => error!("Could not encode changes for player {}: {}", player, e),
        }
        *doc = draft;
    }

    // ========================================================================
    // Compound catch mutation
    // ========================================================================

    /// Credit a resolved catch: reward value, secondary reward, experience,
    /// the new inventory entry and any dropped accessory, all in one step.
    pub fn apply_catch_result<R: Rng + ?Sized>(
        &self,
        player: &PlayerId,
        roll: &CatchRoll,
        mods: &Modifiers,
        now: i64,
        rng: &mut R,
    ) -> Result<AppliedCatch, CatchError> {
        let config = self.config.clone();
        self.mutate(player, |doc| {
            let cap = config.inventory_cap;
            if doc.caught_objects.len() >= cap {
                debug!("Player {} inventory full ({}/{})", player, doc.caught_objects.len(), cap);
                return Err(CatchError::InventoryFull { cap });
            }

            let id = doc.generate_catch_id(rng).ok_or(CatchError::IdSpaceExhausted)?;
            let catch = roll.to_catch_object(id, now);

            if config.credit_catch_value {
                doc.currency = doc.currency.saturating_add(catch.reward_value);
            }
            let secondary_reward = roll.valuation.secondary_reward;
            doc.premium_currency = doc.premium_currency.saturating_add(secondary_reward);

            let experience_gained = config.xp_per_catch.saturating_add(mods.xp_bonus);
            let level_up = apply_experience(doc, experience_gained, &config);

            if let Some(accessory) = &roll.dropped_accessory {
                *doc.owned_accessories.entry(accessory.clone()).or_insert(0) += 1;
                info!("Player {} found accessory {} while fishing", player, accessory);
            }

            doc.caught_objects.push(catch.clone());

            Ok(AppliedCatch {
                catch,
                secondary_reward,
                experience_gained,
                level_up,
                dropped_accessory: roll.dropped_accessory.clone(),
                currency_after: doc.currency,
            })
        })
    }
}

// ============================================================================
// Field diffing
// ============================================================================

fn document_fields(doc: &PlayerDocument) -> Result<DocumentPatch, serde_json::Error> {
    match serde_json::to_value(doc)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(DocumentPatch::new()),
    }
}

/// Top-level fields whose value differs between `before` and `after`
fn changed_fields(before: &PlayerDocument, after: &PlayerDocument) -> Result<DocumentPatch, serde_json::Error> {
    let before = document_fields(before)?;
    let after = document_fields(after)?;
    Ok(after
        .into_iter()
        .filter(|(field, value)| before.get(field) != Some(value))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryBackend;
    use rand_xoshiro::rand_core::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use serde_json::json;

    async fn store_with(backend: Arc<MemoryBackend>) -> PlayerStore {
        PlayerStore::hydrate(
            backend,
            Arc::new(Catalog::builtin()),
            Arc::new(PipelineConfig::default()),
            PersistConfig::default(),
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_changed_fields_only_lists_differences() {
        let before = PlayerDocument::default();
        let mut after = before.clone();
        after.currency = 25;
        after.experience = 10;

        let patch = changed_fields(&before, &after).unwrap();
        let mut keys: Vec<&str> = patch.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["currency", "experience"]);
    }

    #[tokio::test]
    async fn test_unknown_player_reads_default() {
        let backend = Arc::new(MemoryBackend::new());
        let store = store_with(backend.clone()).await;
        let player = PlayerId::from("new");

        assert_eq!(store.read_level(&player), 1);
        assert_eq!(store.read_currency(&player), 0);
        assert!(store.contains(&player));

        store.flush().await;
        let stored = backend.document("players", "new").expect("default document persisted");
        assert_eq!(stored["level"], 1);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_document_untouched() {
        let store = store_with(Arc::new(MemoryBackend::new())).await;
        let player = PlayerId::from("p");
        store.update(&player, |d| d.currency = 10);

        let result: Result<(), &str> = store.mutate(&player, |d| {
            d.currency = 0;
            d.level = 50;
            Err("rejected")
        });

        assert!(result.is_err());
        assert_eq!(store.read_currency(&player), 10);
        assert_eq!(store.read_level(&player), 1);
    }

    #[tokio::test]
    async fn test_mutation_persists_changed_fields() {
        let backend = Arc::new(MemoryBackend::new());
        let store = store_with(backend.clone()).await;
        let player = PlayerId::from("p");

        store.update(&player, |d| d.currency = 99);
        store.flush().await;

        assert_eq!(backend.document("players", "p").unwrap()["currency"], 99);
    }

    #[tokio::test]
    async fn test_hydration_rejects_corrupt_document() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert_raw("players", "bad", json!({"currency": "lots"}).as_object().cloned().unwrap());

        let result = PlayerStore::hydrate(
            backend,
            Arc::new(Catalog::builtin()),
            Arc::new(PipelineConfig::default()),
            PersistConfig::default(),
        )
        .await;
        assert!(matches!(result, Err(StoreError::CorruptDocument { .. })));
    }

    #[tokio::test]
    async fn test_apply_catch_rejects_full_inventory() {
        let store = store_with(Arc::new(MemoryBackend::new())).await;
        let player = PlayerId::from("p");
        let cap = store.config().inventory_cap;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);

        let roll = catch_core::roll_catch(
            store.catalog(),
            store.config(),
            &Modifiers::default(),
            &catch_core::WorldState::clear(),
            &mut rng,
        )
        .unwrap();

        for _ in 0..cap {
            store.apply_catch_result(&player, &roll, &Modifiers::default(), 0, &mut rng).unwrap();
        }
        let before = store.snapshot(&player);
        let err = store.apply_catch_result(&player, &roll, &Modifiers::default(), 0, &mut rng);

        assert!(matches!(err, Err(CatchError::InventoryFull { cap: c }) if c == cap));
        assert_eq!(store.snapshot(&player), before, "rejected catch must not mutate");
    }

    #[tokio::test]
    async fn test_mutate_pair_commits_both() {
        let store = store_with(Arc::new(MemoryBackend::new())).await;
        let a = PlayerId::from("b-second");
        let b = PlayerId::from("a-first");

        let result: Result<(), SamePlayer> = store.mutate_pair(&a, &b, |x, y| {
            x.currency = 1;
            y.currency = 2;
            Ok(())
        });
        result.unwrap();

        assert_eq!(store.read_currency(&a), 1, "documents follow argument order");
        assert_eq!(store.read_currency(&b), 2);
    }

    #[tokio::test]
    async fn test_mutate_pair_rejects_same_player() {
        let store = store_with(Arc::new(MemoryBackend::new())).await;
        let p = PlayerId::from("alone");
        store.add_currency(&p, 10).unwrap();
        let before = store.snapshot(&p);

        let result: Result<(), SamePlayer> = store.mutate_pair(&p, &p, |x, _| {
            x.currency = 0;
            Ok(())
        });

        assert_eq!(result, Err(SamePlayer(p.clone())), "same id twice must fail, not deadlock");
        assert_eq!(store.snapshot(&p), before, "rejected pair mutation must not mutate");
    }
}
