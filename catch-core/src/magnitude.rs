//! Magnitude (size) resolution.
//!
//! A discrete size class is drawn first, then a continuous value inside that
//! class's percentage band of the base magnitude:
//!
//! ```text
//! value = round2(base × U(pctLow, pctHigh) × worldMult × loadoutMult)
//! ```

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::RarityTierDef;
use crate::config::{PipelineConfig, SizeClassBand};
use crate::error::CatalogError;
use crate::species::ResolvedSpecies;
use crate::world::WorldState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Tiny,
    Normal,
    Huge,
    Gigantic,
}

impl SizeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeClass::Tiny => "tiny",
            SizeClass::Normal => "normal",
            SizeClass::Huge => "huge",
            SizeClass::Gigantic => "gigantic",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Magnitude {
    pub value: f64,
    pub size_class: SizeClass,
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Base magnitude: species override, else the tier's range midpoint
pub fn base_magnitude(species: &ResolvedSpecies, tier: &RarityTierDef) -> f64 {
    match species.base_magnitude {
        Some(m) if m.is_finite() && m > 0.0 => m,
        _ => tier.magnitude_midpoint(),
    }
}

/// Draw a size class; probabilities that do not sum to 1 are normalised
pub fn sample_size_class<'a, R: Rng + ?Sized>(
    bands: &'a [SizeClassBand],
    rng: &mut R,
) -> Result<&'a SizeClassBand, CatalogError> {
    let index = WeightedIndex::new(bands.iter().map(|b| b.probability.max(0.0))).map_err(|e| {
        CatalogError::InvalidWeights {
            table: "size_classes",
            reason: e.to_string(),
        }
    })?;
    Ok(&bands[index.sample(rng)])
}

pub fn resolve_magnitude<R: Rng + ?Sized>(
    config: &PipelineConfig,
    species: &ResolvedSpecies,
    tier: &RarityTierDef,
    world: &WorldState,
    magnitude_multiplier: f64,
    rng: &mut R,
) -> Result<Magnitude, CatalogError> {
    let band = sample_size_class(&config.size_classes, rng)?;
    let pct = if band.pct_high > band.pct_low {
        rng.gen_range(band.pct_low..=band.pct_high)
    } else {
        band.pct_low
    };
    let loadout = if magnitude_multiplier.is_finite() && magnitude_multiplier > 0.0 {
        magnitude_multiplier
    } else {
        1.0
    };

    let value = round2(base_magnitude(species, tier) * pct * world.magnitude_factor() * loadout);
    Ok(Magnitude {
        value,
        size_class: band.class,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::rarity::Rarity;
    use rand_xoshiro::rand_core::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn species(base: Option<f64>) -> ResolvedSpecies {
        ResolvedSpecies {
            name: "Perch".into(),
            tag: String::new(),
            tier: Rarity::Common,
            base_magnitude: base,
            unit_price: None,
            shiny_multiplier: 1.0,
            is_event_variant: false,
        }
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(2.345_6), 2.35);
        assert_eq!(round2(10.0), 10.0);
        assert_eq!(round2(0.004), 0.0);
    }

    #[test]
    fn test_base_magnitude_falls_back_to_midpoint() {
        let catalog = Catalog::builtin();
        let tier = &catalog.rarities[&Rarity::Rare];
        assert_eq!(base_magnitude(&species(None), tier), 3.5);
        assert_eq!(base_magnitude(&species(Some(12.0)), tier), 12.0);
    }

    #[test]
    fn test_single_class_stays_in_band() {
        let catalog = Catalog::builtin();
        let tier = &catalog.rarities[&Rarity::Common];
        let config = PipelineConfig {
            size_classes: vec![SizeClassBand {
                class: SizeClass::Huge,
                probability: 1.0,
                pct_low: 1.5,
                pct_high: 2.5,
            }],
            ..Default::default()
        };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        for _ in 0..500 {
            let m = resolve_magnitude(&config, &species(Some(4.0)), tier, &WorldState::clear(), 1.0, &mut rng)
                .unwrap();
            assert_eq!(m.size_class, SizeClass::Huge);
            assert!(m.value >= 6.0 && m.value <= 10.0, "value {} outside band", m.value);
        }
    }

    #[test]
    fn test_multipliers_scale_value() {
        let catalog = Catalog::builtin();
        let tier = &catalog.rarities[&Rarity::Common];
        let config = PipelineConfig {
            size_classes: vec![SizeClassBand {
                class: SizeClass::Normal,
                probability: 1.0,
                pct_low: 1.0,
                pct_high: 1.0,
            }],
            ..Default::default()
        };
        let world = WorldState {
            magnitude_multiplier: 1.5,
            ..WorldState::clear()
        };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        let m = resolve_magnitude(&config, &species(Some(2.0)), tier, &world, 1.1, &mut rng).unwrap();
        assert_eq!(m.value, 3.3);

        let m = resolve_magnitude(&config, &species(Some(2.0)), tier, &world, 0.0, &mut rng).unwrap();
        assert_eq!(m.value, 3.0, "zero loadout multiplier must be a no-op");
    }

    #[test]
    fn test_unnormalised_probabilities() {
        let bands = vec![
            SizeClassBand {
                class: SizeClass::Tiny,
                probability: 3.0,
                pct_low: 0.5,
                pct_high: 0.7,
            },
            SizeClassBand {
                class: SizeClass::Gigantic,
                probability: 1.0,
                pct_low: 5.0,
                pct_high: 7.0,
            },
        ];
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let n = 20_000;
        let tiny = (0..n)
            .filter(|_| sample_size_class(&bands, &mut rng).unwrap().class == SizeClass::Tiny)
            .count();
        let observed = tiny as f64 / n as f64;
        assert!((observed - 0.75).abs() < 0.02, "tiny frequency {}", observed);
    }
}
