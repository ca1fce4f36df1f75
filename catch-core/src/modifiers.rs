//! Modifier aggregation.
//!
//! Folds the buffs of a player's equipped tool, equipped accessories and active
//! companions into one [`Modifiers`] bundle. Additive fields are summed,
//! `magnitude_multiplier` is multiplied. Unknown catalog ids contribute
//! nothing; aggregation never fails.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Buffs, Catalog};

/// The parts of a player document that carry modifiers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Loadout {
    pub tool_level: u32,
    pub equipped_accessories: Vec<String>,
    pub active_companions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    pub luck_bonus: f64,
    pub timeout_bonus: f64,
    pub challenge_length_reduction: u32,
    pub xp_bonus: u64,
    pub magnitude_multiplier: f64,
    pub accessory_slot_bonus: u32,
    /// Challenge keys added by the equipped tool
    pub tool_length_add: u32,
    /// Seconds the equipped tool removes from the challenge timeout
    pub tool_timeout_penalty: f64,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            luck_bonus: 0.0,
            timeout_bonus: 0.0,
            challenge_length_reduction: 0,
            xp_bonus: 0,
            magnitude_multiplier: 1.0,
            accessory_slot_bonus: 0,
            tool_length_add: 0,
            tool_timeout_penalty: 0.0,
        }
    }
}

impl Modifiers {
    fn absorb(&mut self, buffs: &Buffs) {
        self.luck_bonus += buffs.luck;
        self.timeout_bonus += buffs.timeout_bonus;
        self.challenge_length_reduction += buffs.challenge_length_reduction;
        self.xp_bonus += buffs.xp_bonus;
        self.accessory_slot_bonus += buffs.extra_slot;
        if let Some(m) = buffs.magnitude_multiplier {
            if m.is_finite() && m > 0.0 {
                self.magnitude_multiplier *= m;
            }
        }
    }
}

/// Aggregate all modifier sources of a loadout
pub fn aggregate(catalog: &Catalog, loadout: &Loadout) -> Modifiers {
    let mut mods = Modifiers::default();

    match catalog.tool(loadout.tool_level) {
        Some(tool) => {
            mods.luck_bonus += tool.luck;
            mods.tool_length_add = tool.length_add;
            mods.tool_timeout_penalty = tool.timeout_penalty;
        }
        None => debug!("Unknown tool tier {}, no tool modifiers", loadout.tool_level),
    }

    for id in &loadout.equipped_accessories {
        match catalog.accessories.get(id) {
            Some(def) => mods.absorb(&def.buffs),
            None => debug!("Unknown accessory '{}' ignored", id),
        }
    }

    for id in &loadout.active_companions {
        match catalog.companions.get(id) {
            Some(def) => mods.absorb(&def.buffs),
            None => debug!("Unknown companion '{}' ignored", id),
        }
    }

    mods
}

/// Extra accessory slots granted by the active companions alone
pub fn companion_slot_bonus(catalog: &Catalog, active_companions: &[String]) -> u32 {
    active_companions
        .iter()
        .filter_map(|id| catalog.companions.get(id))
        .map(|def| def.buffs.extra_slot)
        .sum()
}
