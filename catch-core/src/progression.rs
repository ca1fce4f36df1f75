//! Experience, levels and the level-gated limits.

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::constants::{
    ACCESSORY_SLOTS_UNLOCKED, ACCESSORY_SLOT_UNLOCK_LEVEL, BASE_ACTIVE_COMPANIONS,
    EXTRA_COMPANION_SLOT_LEVEL, MAX_ACTIVE_COMPANIONS, TANK_CAPACITY_BY_LEVEL,
};
use crate::player::PlayerDocument;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub levels_gained: u32,
    pub premium_awarded: u64,
}

/// XP needed to advance from `level` to `level + 1`
pub fn xp_to_next(level: u32, config: &PipelineConfig) -> u64 {
    config.base_xp_per_level.saturating_mul(level.max(1) as u64)
}

/// Add experience and level up while enough XP is banked.
///
/// Each level consumes its threshold and pays `level × level_up_premium_per_level`
/// premium currency for the level reached.
pub fn apply_experience(doc: &mut PlayerDocument, amount: u64, config: &PipelineConfig) -> LevelUp {
    let mut result = LevelUp::default();
    doc.experience = doc.experience.saturating_add(amount);
    doc.level = doc.level.max(1);

    loop {
        let need = xp_to_next(doc.level, config);
        if need == 0 || doc.experience < need {
            break;
        }
        doc.experience -= need;
        doc.level += 1;
        let reward = doc.level as u64 * config.level_up_premium_per_level;
        doc.premium_currency = doc.premium_currency.saturating_add(reward);
        result.levels_gained += 1;
        result.premium_awarded += reward;
    }
    result
}

/// Accessory slots: level-gated base plus companion-granted bonus slots
pub fn accessory_slot_limit(level: u32, companion_bonus: u32) -> usize {
    let base = if level >= ACCESSORY_SLOT_UNLOCK_LEVEL {
        ACCESSORY_SLOTS_UNLOCKED
    } else {
        0
    };
    base + companion_bonus as usize
}

pub fn active_companion_limit(level: u32) -> usize {
    if level >= EXTRA_COMPANION_SLOT_LEVEL {
        MAX_ACTIVE_COMPANIONS
    } else {
        BASE_ACTIVE_COMPANIONS
    }
}

pub fn tank_capacity(level: u32) -> usize {
    TANK_CAPACITY_BY_LEVEL
        .iter()
        .rev()
        .find(|(min_level, _)| level >= *min_level)
        .map(|(_, cap)| *cap)
        .unwrap_or(TANK_CAPACITY_BY_LEVEL[0].1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_level_up() {
        let config = PipelineConfig::default();
        let mut doc = PlayerDocument::default();
        let up = apply_experience(&mut doc, 130, &config);
        assert_eq!(doc.level, 2);
        assert_eq!(doc.experience, 30, "remainder carries over");
        assert_eq!(up.levels_gained, 1);
        assert_eq!(up.premium_awarded, 30);
        assert_eq!(doc.premium_currency, 30);
    }

    #[test]
    fn test_multiple_levels_in_one_grant() {
        let config = PipelineConfig::default();
        let mut doc = PlayerDocument::default();
        // 100 (1->2) + 200 (2->3) + 300 (3->4) = 600
        let up = apply_experience(&mut doc, 650, &config);
        assert_eq!(doc.level, 4);
        assert_eq!(doc.experience, 50);
        assert_eq!(up.levels_gained, 3);
        assert_eq!(up.premium_awarded, (2 + 3 + 4) * 15);
    }

    #[test]
    fn test_no_level_up_below_threshold() {
        let config = PipelineConfig::default();
        let mut doc = PlayerDocument::default();
        let up = apply_experience(&mut doc, 99, &config);
        assert_eq!(up, LevelUp::default());
        assert_eq!(doc.level, 1);
    }

    #[test]
    fn test_accessory_slots() {
        assert_eq!(accessory_slot_limit(1, 0), 0);
        assert_eq!(accessory_slot_limit(4, 1), 1);
        assert_eq!(accessory_slot_limit(5, 0), 1);
        assert_eq!(accessory_slot_limit(12, 2), 3);
    }

    #[test]
    fn test_companion_slots() {
        assert_eq!(active_companion_limit(1), 2);
        assert_eq!(active_companion_limit(9), 2);
        assert_eq!(active_companion_limit(10), 3);
    }

    #[test]
    fn test_tank_capacity_thresholds() {
        assert_eq!(tank_capacity(1), 2);
        assert_eq!(tank_capacity(4), 2);
        assert_eq!(tank_capacity(5), 3);
        assert_eq!(tank_capacity(10), 4);
        assert_eq!(tank_capacity(19), 4);
        assert_eq!(tank_capacity(20), 5);
        assert_eq!(tank_capacity(99), 5);
    }
}
