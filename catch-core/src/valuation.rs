//! Valuation: magnitude and price into currency rewards.
//!
//! Pure and deterministic; no random source is involved.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::config::PipelineConfig;
use crate::error::CatalogError;
use crate::rarity::Rarity;
use crate::species::ResolvedSpecies;
use crate::world::WorldState;

/// Absorbs binary representation error such as `100 × 1.13 = 112.999…`
const FLOOR_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valuation {
    pub unit_price: u64,
    pub reward_value: u64,
    pub secondary_reward: u64,
}

/// `floor(unitPrice × magnitude × (shinyMultiplier if shiny))`, never negative
pub fn reward_value(unit_price: u64, magnitude: f64, shiny: bool, shiny_multiplier: f64) -> u64 {
    let mult = if shiny { shiny_multiplier } else { 1.0 };
    let raw = unit_price as f64 * magnitude * mult;
    if raw.is_finite() && raw > 0.0 {
        (raw + FLOOR_EPSILON).floor() as u64
    } else {
        0
    }
}

/// `table[tier] × worldMultiplier`, zero when the tier has no entry
pub fn secondary_reward(catalog: &Catalog, tier: Rarity, world: &WorldState) -> u64 {
    let raw = catalog.secondary_reward(tier) as f64 * world.secondary_factor();
    if raw.is_finite() && raw > 0.0 {
        (raw + FLOOR_EPSILON).floor() as u64
    } else {
        0
    }
}

pub fn valuate(
    catalog: &Catalog,
    config: &PipelineConfig,
    species: &ResolvedSpecies,
    magnitude: f64,
    shiny: bool,
    tier: Rarity,
    world: &WorldState,
) -> Result<Valuation, CatalogError> {
    let unit_price = match species.unit_price {
        Some(price) => price,
        None => catalog.tier(tier)?.unit_price,
    };
    Ok(Valuation {
        unit_price,
        reward_value: reward_value(unit_price, magnitude, shiny, config.shiny_value_multiplier),
        secondary_reward: secondary_reward(catalog, tier, world),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn species(price: Option<u64>) -> ResolvedSpecies {
        ResolvedSpecies {
            name: "Perch".into(),
            tag: String::new(),
            tier: Rarity::Common,
            base_magnitude: None,
            unit_price: price,
            shiny_multiplier: 1.0,
            is_event_variant: false,
        }
    }

    #[test]
    fn test_plain_catch_value() {
        let catalog = Catalog::builtin();
        let config = PipelineConfig::default();
        let v = valuate(&catalog, &config, &species(Some(10)), 2.5, false, Rarity::Common, &WorldState::clear())
            .unwrap();
        assert_eq!(v.reward_value, 25);
        assert_eq!(v.secondary_reward, 0);
    }

    #[test]
    fn test_shiny_catch_value() {
        let catalog = Catalog::builtin();
        let config = PipelineConfig::default();
        let v = valuate(&catalog, &config, &species(Some(10)), 2.5, true, Rarity::Common, &WorldState::clear())
            .unwrap();
        assert_eq!(v.reward_value, 500);
    }

    #[test]
    fn test_tier_default_price() {
        let catalog = Catalog::builtin();
        let config = PipelineConfig::default();
        let v = valuate(&catalog, &config, &species(None), 1.0, false, Rarity::Rare, &WorldState::clear()).unwrap();
        assert_eq!(v.unit_price, 120);
        assert_eq!(v.reward_value, 120);
    }

    #[test]
    fn test_floor_tolerates_representation_error() {
        assert_eq!(reward_value(100, 1.13, false, 20.0), 113);
        assert_eq!(reward_value(7, 0.29, false, 20.0), 2);
    }

    #[test]
    fn test_never_negative() {
        assert_eq!(reward_value(10, -3.0, false, 20.0), 0);
        assert_eq!(reward_value(10, 2.0, true, -1.0), 0);
    }

    #[test]
    fn test_secondary_reward_uses_world_multiplier() {
        let catalog = Catalog::builtin();
        let aurora = WorldState {
            secondary_multiplier: 2.0,
            ..WorldState::clear()
        };
        assert_eq!(secondary_reward(&catalog, Rarity::Epic, &aurora), 10);
        assert_eq!(secondary_reward(&catalog, Rarity::Epic, &WorldState::clear()), 5);
        assert_eq!(secondary_reward(&catalog, Rarity::Trash, &aurora), 0);
    }

    #[test]
    fn test_unknown_tier_without_override_is_error() {
        let mut catalog = Catalog::builtin();
        catalog.rarities.remove(&Rarity::Rare);
        let config = PipelineConfig::default();
        let err = valuate(&catalog, &config, &species(None), 1.0, false, Rarity::Rare, &WorldState::clear());
        assert!(matches!(err, Err(CatalogError::UnknownRarity(Rarity::Rare))));
    }
}
