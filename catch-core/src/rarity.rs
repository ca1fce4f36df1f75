//! Rarity tiers and the luck-responsive rarity sampler.
//!
//! ## Weight formula
//! ```text
//! w_r = max(0, baseWeight_r × (1 + luck × luckFactor_r / 100))
//! P(r) = w_r / Σ w
//! ```
//! `luck` is the aggregated player luck plus the active world-state luck
//! bonus. Tiers with `luckFactor = 0` keep a constant weight, so raising luck
//! shifts probability mass toward every tier whose factor is positive.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::catalog::{Catalog, RarityTierDef};
use crate::error::CatalogError;
use crate::world::WorldState;

// ============================================================================
// Rarity tiers
// ============================================================================

/// Ordered rarity tiers, lowest value first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Trash,
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythical,
    Unreal,
}

impl Rarity {
    pub const ALL: [Rarity; 8] = [
        Rarity::Trash,
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Mythical,
        Rarity::Unreal,
    ];

    /// Key used in persisted documents and catalog files
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Trash => "trash",
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
            Rarity::Mythical => "mythical",
            Rarity::Unreal => "unreal",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Rarity::Trash => "Trash",
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
            Rarity::Mythical => "Mythical",
            Rarity::Unreal => "Unreal",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rarity::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown rarity `{s}`"))
    }
}

// ============================================================================
// Weights
// ============================================================================

/// Effective sampling weight of one tier at the given luck, clamped at zero
pub fn effective_weight(def: &RarityTierDef, luck: f64) -> f64 {
    let w = def.base_weight * (1.0 + luck * def.luck_factor / 100.0);
    if w.is_finite() {
        w.max(0.0)
    } else {
        0.0
    }
}

/// Effective weights for every catalog tier, in tier order
pub fn effective_weights(catalog: &Catalog, luck: f64) -> Vec<(Rarity, f64)> {
    catalog
        .rarities
        .iter()
        .map(|(rarity, def)| (*rarity, effective_weight(def, luck)))
        .collect()
}

/// Theoretical probability of each tier at the given luck
pub fn distribution(catalog: &Catalog, luck: f64) -> Result<Vec<(Rarity, f64)>, CatalogError> {
    let weights = effective_weights(catalog, luck);
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Err(CatalogError::ZeroTotalWeight { luck });
    }
    Ok(weights.into_iter().map(|(r, w)| (r, w / total)).collect())
}

/// Total luck fed to the sampler: player luck plus the world-state bonus
pub fn total_luck(player_luck: f64, world: &WorldState) -> f64 {
    player_luck + world.luck_bonus
}

// ============================================================================
// Sampling
// ============================================================================

/// Draw one rarity tier by weighted random selection.
///
/// Fails with [`CatalogError::ZeroTotalWeight`] when no tier has positive
/// weight; the caller must not substitute a default tier.
pub fn sample_rarity<R: Rng + ?Sized>(
    catalog: &Catalog,
    luck: f64,
    world: &WorldState,
    rng: &mut R,
) -> Result<Rarity, CatalogError> {
    let luck = total_luck(luck, world);
    let weights = effective_weights(catalog, luck);
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Err(CatalogError::ZeroTotalWeight { luck });
    }

    let index = WeightedIndex::new(weights.iter().map(|(_, w)| *w)).map_err(|e| {
        CatalogError::InvalidWeights {
            table: "rarities",
            reason: e.to_string(),
        }
    })?;
    Ok(weights[index.sample(rng)].0)
}

/// Result of a Monte-Carlo run of the rarity sampler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub luck: f64,
    pub trials: u64,
    pub counts: BTreeMap<Rarity, u64>,
    pub expected: BTreeMap<Rarity, f64>,
}

impl SimulationReport {
    /// Observed frequency of a tier
    pub fn observed(&self, rarity: Rarity) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.counts.get(&rarity).copied().unwrap_or(0) as f64 / self.trials as f64
    }

    /// Largest absolute gap between observed and theoretical frequency
    pub fn max_deviation(&self) -> f64 {
        self.expected
            .iter()
            .map(|(r, p)| (self.observed(*r) - p).abs())
            .fold(0.0, f64::max)
    }
}

const SIM_CHUNK: u64 = 100_000;

/// Run `trials` independent draws in parallel.
///
/// Each chunk gets its own stream by jumping a single seeded generator, so the
/// report is reproducible for a given `seed` regardless of thread count.
pub fn simulate(
    catalog: &Catalog,
    luck: f64,
    world: &WorldState,
    trials: u64,
    seed: u64,
) -> Result<SimulationReport, CatalogError> {
    let expected: BTreeMap<Rarity, f64> =
        distribution(catalog, total_luck(luck, world))?.into_iter().collect();

    let chunks = trials.div_ceil(SIM_CHUNK);
    let mut streams = Vec::with_capacity(chunks as usize);
    let mut base = Xoshiro256PlusPlus::seed_from_u64(seed);
    for i in 0..chunks {
        let n = SIM_CHUNK.min(trials - i * SIM_CHUNK);
        streams.push((base.clone(), n));
        base.jump();
    }

    let partials: Result<Vec<BTreeMap<Rarity, u64>>, CatalogError> = streams
        .into_par_iter()
        .map(|(mut rng, n)| {
            let mut counts = BTreeMap::new();
            for _ in 0..n {
                let r = sample_rarity(catalog, luck, world, &mut rng)?;
                *counts.entry(r).or_insert(0u64) += 1;
            }
            Ok(counts)
        })
        .collect();

    let mut counts: BTreeMap<Rarity, u64> = catalog.rarities.keys().map(|r| (*r, 0)).collect();
    for partial in partials? {
        for (r, n) in partial {
            *counts.entry(r).or_insert(0) += n;
        }
    }

    Ok(SimulationReport {
        luck,
        trials,
        counts,
        expected,
    })
}
