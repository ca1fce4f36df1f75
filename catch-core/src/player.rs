//! Player document model.
//!
//! Field names serialize in camelCase and must stay stable: they are the keys
//! of the persisted player documents.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{CATCH_ID_ALPHABET, CATCH_ID_LEN, CATCH_ID_MAX_ATTEMPTS};
use crate::magnitude::SizeClass;
use crate::modifiers::Loadout;
use crate::rarity::Rarity;

/// One caught object. Immutable once created; only removed by sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatchObject {
    pub id: String,
    pub species_name: String,
    pub rarity_tier: Rarity,
    pub magnitude: f64,
    pub magnitude_class: SizeClass,
    pub unit_price: u64,
    pub reward_value: u64,
    pub caught_at_epoch: i64,
    pub shiny: bool,
    #[serde(default)]
    pub event_variant: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incubation {
    pub id: String,
    pub tier: u32,
    pub ready_at_epoch: i64,
    pub started_at_epoch: i64,
}

/// Derived from the clock only; never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncubationStatus {
    Incubating { remaining_secs: i64 },
    Ready,
}

impl Incubation {
    pub fn status(&self, now: i64) -> IncubationStatus {
        if now >= self.ready_at_epoch {
            IncubationStatus::Ready
        } else {
            IncubationStatus::Incubating {
                remaining_secs: self.ready_at_epoch - now,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TankEntry {
    pub placed_at_epoch: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerDocument {
    pub currency: u64,
    pub premium_currency: u64,
    pub experience: u64,
    pub level: u32,
    pub tool_level: u32,
    pub max_tool_level_owned: u32,
    pub equipped_accessories: Vec<String>,
    pub owned_accessories: BTreeMap<String, u32>,
    pub companions_owned: Vec<String>,
    pub active_companions: Vec<String>,
    pub pending_incubations: Vec<Incubation>,
    pub caught_objects: Vec<CatchObject>,
    pub display_tank: BTreeMap<String, TankEntry>,
    pub last_daily_claim_epoch: i64,
}

impl Default for PlayerDocument {
    fn default() -> Self {
        Self {
            currency: 0,
            premium_currency: 0,
            experience: 0,
            level: 1,
            tool_level: 1,
            max_tool_level_owned: 1,
            equipped_accessories: Vec::new(),
            owned_accessories: BTreeMap::new(),
            companions_owned: Vec::new(),
            active_companions: Vec::new(),
            pending_incubations: Vec::new(),
            caught_objects: Vec::new(),
            display_tank: BTreeMap::new(),
            last_daily_claim_epoch: 0,
        }
    }
}

impl PlayerDocument {
    pub fn loadout(&self) -> Loadout {
        Loadout {
            tool_level: self.tool_level,
            equipped_accessories: self.equipped_accessories.clone(),
            active_companions: self.active_companions.clone(),
        }
    }

    pub fn find_catch(&self, id: &str) -> Option<&CatchObject> {
        self.caught_objects.iter().find(|c| c.id == id)
    }

    pub fn owned_accessory_count(&self, id: &str) -> u32 {
        self.owned_accessories.get(id).copied().unwrap_or(0)
    }

    pub fn owned_companion_count(&self, id: &str) -> usize {
        self.companions_owned.iter().filter(|c| *c == id).count()
    }

    /// Tank entries whose catch still exists
    pub fn valid_tank_entries(&self) -> impl Iterator<Item = (&CatchObject, &TankEntry)> {
        self.display_tank
            .iter()
            .filter_map(|(id, entry)| self.find_catch(id).map(|c| (c, entry)))
    }

    pub fn valid_tank_len(&self) -> usize {
        self.valid_tank_entries().count()
    }

    pub fn in_tank(&self, id: &str) -> bool {
        self.display_tank.contains_key(id) && self.find_catch(id).is_some()
    }

    /// Drop tank entries pointing at catches that no longer exist
    pub fn prune_tank(&mut self) -> usize {
        let before = self.display_tank.len();
        let ids: Vec<String> = self
            .display_tank
            .keys()
            .filter(|id| self.find_catch(id).is_none())
            .cloned()
            .collect();
        for id in ids {
            self.display_tank.remove(&id);
        }
        before - self.display_tank.len()
    }

    /// Fresh catch id unique within this document's catches
    pub fn generate_catch_id<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
        generate_catch_id(rng, |candidate| self.find_catch(candidate).is_some())
    }
}

/// Draw a short `[A-Za-z0-9]` id, retrying while `taken` reports a clash
pub fn generate_catch_id<R, F>(rng: &mut R, taken: F) -> Option<String>
where
    R: Rng + ?Sized,
    F: Fn(&str) -> bool,
{
    for _ in 0..CATCH_ID_MAX_ATTEMPTS {
        let candidate: String = (0..CATCH_ID_LEN)
            .map(|_| CATCH_ID_ALPHABET[rng.gen_range(0..CATCH_ID_ALPHABET.len())] as char)
            .collect();
        if !taken(&candidate) {
            return Some(candidate);
        }
    }
    None
}
