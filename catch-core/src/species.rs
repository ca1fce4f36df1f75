//! Species & variant resolution.
//!
//! ## Stage order
//! ```text
//! tier ──> event variants of tier (world) ──> first Bernoulli success wins
//!                    │ none succeeded
//!                    v
//!          weighted pick from normal pool (rate, default 1)
//!                    │
//!                    v
//!          shiny roll (normal species only)
//! ```

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, EventVariantDef, SpeciesDef};
use crate::config::PipelineConfig;
use crate::error::CatalogError;
use crate::rarity::Rarity;
use crate::world::WorldState;

/// The species a catch resolved to, with any catalog overrides still optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSpecies {
    pub name: String,
    pub tag: String,
    pub tier: Rarity,
    pub base_magnitude: Option<f64>,
    pub unit_price: Option<u64>,
    pub shiny_multiplier: f64,
    pub is_event_variant: bool,
}

impl ResolvedSpecies {
    fn from_def(def: &SpeciesDef, tier: Rarity, is_event_variant: bool) -> Self {
        Self {
            name: def.name.clone(),
            tag: def.tag.clone(),
            tier,
            base_magnitude: def.base_magnitude,
            unit_price: def.unit_price,
            shiny_multiplier: def.shiny_multiplier,
            is_event_variant,
        }
    }
}

/// Per-catch chance that one event variant overrides the normal pool.
///
/// With `avg = 1 / poolSize`, an explicit chance is capped at
/// `avg × explicit_event_chance_cap`; otherwise `avg × event_vs_normal_scale`.
pub fn event_variant_chance(variant: &EventVariantDef, pool_size: usize, config: &PipelineConfig) -> f64 {
    let avg_normal = 1.0 / pool_size.max(1) as f64;
    let chance = match variant.chance {
        Some(explicit) => explicit.min(avg_normal * config.explicit_event_chance_cap),
        None => avg_normal * config.event_vs_normal_scale,
    };
    if chance.is_finite() {
        chance.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Resolve the species for a sampled tier
pub fn resolve_species<R: Rng + ?Sized>(
    catalog: &Catalog,
    config: &PipelineConfig,
    tier: Rarity,
    world: &WorldState,
    rng: &mut R,
) -> Result<ResolvedSpecies, CatalogError> {
    let pool = catalog.species_pool(tier);
    if pool.is_empty() {
        return Err(CatalogError::EmptySpeciesPool(tier));
    }

    for variant in world.variants_for(tier) {
        let chance = event_variant_chance(variant, pool.len(), config);
        if rng.gen_bool(chance) {
            return Ok(ResolvedSpecies::from_def(&variant.species, tier, true));
        }
    }

    let index = WeightedIndex::new(pool.iter().map(SpeciesDef::effective_rate)).map_err(|e| {
        CatalogError::InvalidWeights {
            table: "species",
            reason: format!("{tier}: {e}"),
        }
    })?;
    Ok(ResolvedSpecies::from_def(&pool[index.sample(rng)], tier, false))
}

/// Shiny roll: `base × speciesMultiplier × worldMultiplier`. Event variants never shine.
pub fn roll_shiny<R: Rng + ?Sized>(
    species: &ResolvedSpecies,
    world: &WorldState,
    config: &PipelineConfig,
    rng: &mut R,
) -> bool {
    if species.is_event_variant {
        return false;
    }
    let p = config.base_shiny_probability * species.shiny_multiplier.max(0.0) * world.shiny_factor();
    if !p.is_finite() || p <= 0.0 {
        return false;
    }
    rng.gen_bool(p.min(1.0))
}
