//! Catch service - runs the pipeline for a player and commits the result
//!
//! ## Architecture
//! ```text
//! resolve_catch(player, world)
//!       ↓ capacity check (fast reject, no roll)
//! [PlayerStore] ── loadout ──> aggregate ──> Modifiers
//!       ↓
//! roll_catch(catalog, config, mods, world, rng)     (pure, catch-core)
//!       ↓
//! PlayerStore::apply_catch_result                   (one atomic mutation)
//! ```
//! Each resolution draws a private generator seeded from the service's root
//! generator, so the root lock is held only for one `u64` draw and catches
//! for different players run in parallel.

use parking_lot::Mutex;
use rand::Rng;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use catch_core::challenge::{Challenge, ChallengeParams};
use catch_core::{aggregate, roll_catch, CatalogError, CatchRoll, Modifiers, WorldState};

use crate::now_epoch;
use crate::store::{AppliedCatch, PlayerId, PlayerStore};

#[derive(Debug, thiserror::Error)]
pub enum CatchError {
    #[error("inventory is full ({cap} catches)")]
    InventoryFull { cap: usize },
    #[error("could not allocate a unique catch id")]
    IdSpaceExhausted,
    #[error("configuration error: {0}")]
    Config(#[from] CatalogError),
}

/// Everything a caller needs to report a successful catch
#[derive(Debug, Clone, Serialize)]
pub struct CatchReceipt {
    pub roll: CatchRoll,
    pub applied: AppliedCatch,
    pub weather: String,
}

pub struct CatchService {
    store: Arc<PlayerStore>,
    rng: Mutex<Xoshiro256PlusPlus>,
}

impl CatchService {
    /// `seed` fixes the root generator; `None` seeds from the OS
    pub fn new(store: Arc<PlayerStore>, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        Self {
            store,
            rng: Mutex::new(Xoshiro256PlusPlus::seed_from_u64(seed)),
        }
    }

    pub fn store(&self) -> &Arc<PlayerStore> {
        &self.store
    }

    /// Independent generator for one unit of work
    pub fn fork_rng(&self) -> Xoshiro256PlusPlus {
        let seed: u64 = self.rng.lock().gen();
        Xoshiro256PlusPlus::seed_from_u64(seed)
    }

    pub fn modifiers(&self, player: &PlayerId) -> Modifiers {
        let loadout = self.store.read(player, |doc| doc.loadout());
        aggregate(self.store.catalog(), &loadout)
    }

    pub fn challenge_params(&self, player: &PlayerId) -> ChallengeParams {
        ChallengeParams::derive(self.store.config(), &self.modifiers(player))
    }

    pub fn generate_challenge(&self, player: &PlayerId) -> Challenge {
        Challenge::generate(&self.challenge_params(player), &mut self.fork_rng())
    }

    /// Whether a catch would currently be refused for capacity
    pub fn inventory_full(&self, player: &PlayerId) -> Option<usize> {
        let cap = self.store.config().inventory_cap;
        (self.store.read_inventory_len(player) >= cap).then_some(cap)
    }

    pub fn resolve_catch(&self, player: &PlayerId, world: &WorldState) -> Result<CatchReceipt, CatchError> {
        self.resolve_catch_at(player, world, now_epoch())
    }

    /// Roll and commit one catch at the given wall-clock time
    pub fn resolve_catch_at(&self, player: &PlayerId, world: &WorldState, now: i64) -> Result<CatchReceipt, CatchError> {
        if let Some(cap) = self.inventory_full(player) {
            debug!("Catch refused for {}: inventory full ({})", player, cap);
            return Err(CatchError::InventoryFull { cap });
        }

        let mods = self.modifiers(player);
        let mut rng = self.fork_rng();
        let roll = roll_catch(self.store.catalog(), self.store.config(), &mods, world, &mut rng)?;
        let applied = self.store.apply_catch_result(player, &roll, &mods, now, &mut rng)?;

        debug!(
            "Player {} caught {} [{}] {:.2} ({:?}{}) worth {}",
            player,
            roll.species.name,
            roll.tier,
            roll.magnitude.value,
            roll.magnitude.size_class,
            if roll.shiny { ", shiny" } else { "" },
            roll.valuation.reward_value
        );

        Ok(CatchReceipt {
            roll,
            applied,
            weather: world.weather_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryBackend;
    use crate::store::writer::PersistConfig;
    use catch_core::{Catalog, PipelineConfig};

    async fn service(config: PipelineConfig) -> CatchService {
        let store = PlayerStore::hydrate(
            Arc::new(MemoryBackend::new()),
            Arc::new(Catalog::builtin()),
            Arc::new(config),
            PersistConfig::default(),
        )
        .await
        .unwrap();
        CatchService::new(Arc::new(store), Some(11))
    }

    #[tokio::test]
    async fn test_catch_credits_value_and_experience() {
        let service = service(PipelineConfig::default()).await;
        let p = PlayerId::from("p");

        let receipt = service.resolve_catch_at(&p, &WorldState::clear(), 1_000).unwrap();
        let store = service.store();

        assert_eq!(store.read_currency(&p), receipt.roll.valuation.reward_value);
        assert_eq!(store.read_experience(&p), store.config().xp_per_catch);
        assert_eq!(store.read_caught_objects(&p), vec![receipt.applied.catch.clone()]);
        assert_eq!(receipt.applied.catch.caught_at_epoch, 1_000);
        assert_eq!(receipt.weather, "clear");
    }

    #[tokio::test]
    async fn test_companion_xp_bonus_applies() {
        let service = service(PipelineConfig::default()).await;
        let p = PlayerId::from("p");
        service.store().update(&p, |doc| {
            doc.companions_owned.push("u1".into());
            doc.active_companions.push("u1".into());
        });
        let bonus = service.store().catalog().companions["u1"].buffs.xp_bonus;

        let receipt = service.resolve_catch(&p, &WorldState::clear()).unwrap();
        assert_eq!(receipt.applied.experience_gained, 10 + bonus);
    }

    #[tokio::test]
    async fn test_full_inventory_is_rejected_without_roll() {
        let config = PipelineConfig {
            inventory_cap: 2,
            ..Default::default()
        };
        let service = service(config).await;
        let p = PlayerId::from("p");
        service.resolve_catch(&p, &WorldState::clear()).unwrap();
        service.resolve_catch(&p, &WorldState::clear()).unwrap();
        let currency = service.store().read_currency(&p);

        let err = service.resolve_catch(&p, &WorldState::clear());
        assert!(matches!(err, Err(CatchError::InventoryFull { cap: 2 })));
        assert_eq!(service.store().read_inventory_len(&p), 2);
        assert_eq!(service.store().read_currency(&p), currency);
    }

    #[tokio::test]
    async fn test_tool_lengthens_challenge() {
        let service = service(PipelineConfig::default()).await;
        let p = PlayerId::from("p");
        let base = service.challenge_params(&p);
        service.store().update(&p, |doc| {
            doc.max_tool_level_owned = 3;
            doc.tool_level = 3;
        });
        let upgraded = service.challenge_params(&p);
        assert!(upgraded.len_min > base.len_min, "tool tier 3 adds keys");
        assert!(upgraded.timeout_secs < base.timeout_secs, "and costs time");
    }
}
