//! Static catalog tables: rarity tiers, species pools, tools, accessories,
//! companions, incubation tiers, weathers and the secondary reward table.
//!
//! ## Loading
//! ```text
//! catalog.json / catalog.ron ──> Catalog::load ──> validate() ──> Arc<Catalog>
//!                    (none) ──> Catalog::builtin ─┘
//! ```
//! The catalog is read once at startup and never mutated afterwards. A
//! missing table or a dangling id is a [`CatalogError`], never an empty
//! fallback.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::error::CatalogError;
use crate::rarity::Rarity;

// ============================================================================
// Table entries
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RarityTierDef {
    pub base_weight: f64,
    pub luck_factor: f64,
    /// Default price per magnitude unit when a species does not override it
    pub unit_price: u64,
    /// Default magnitude range; its midpoint is the fallback base magnitude
    pub magnitude_range: (f64, f64),
}

impl RarityTierDef {
    pub fn magnitude_midpoint(&self) -> f64 {
        (self.magnitude_range.0 + self.magnitude_range.1) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesDef {
    pub name: String,
    #[serde(default)]
    pub tag: String,
    /// Relative sampling weight inside its pool; 1 when absent
    #[serde(default)]
    pub rate: Option<f64>,
    #[serde(default)]
    pub base_magnitude: Option<f64>,
    #[serde(default)]
    pub unit_price: Option<u64>,
    #[serde(default = "one")]
    pub shiny_multiplier: f64,
}

fn one() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

impl SpeciesDef {
    pub fn new(name: &str, tag: &str) -> Self {
        Self {
            name: name.to_string(),
            tag: tag.to_string(),
            rate: None,
            base_magnitude: None,
            unit_price: None,
            shiny_multiplier: 1.0,
        }
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_magnitude(mut self, base_magnitude: f64) -> Self {
        self.base_magnitude = Some(base_magnitude);
        self
    }

    pub fn with_price(mut self, unit_price: u64) -> Self {
        self.unit_price = Some(unit_price);
        self
    }

    pub fn effective_rate(&self) -> f64 {
        self.rate.unwrap_or(1.0).max(0.0)
    }
}

/// Numeric bonuses an accessory or companion grants while equipped/active.
/// Every field is optional in catalog files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Buffs {
    pub luck: f64,
    pub timeout_bonus: f64,
    pub challenge_length_reduction: u32,
    pub xp_bonus: u64,
    /// Multiplicative; absent or non-positive means no effect
    pub magnitude_multiplier: Option<f64>,
    pub extra_slot: u32,
}

impl Buffs {
    fn validate(&self, prefix: &str) -> Result<(), CatalogError> {
        check_finite(format!("{prefix}.luck"), self.luck)?;
        check_non_negative(format!("{prefix}.timeout_bonus"), self.timeout_bonus)?;
        if let Some(multiplier) = self.magnitude_multiplier {
            check_finite(format!("{prefix}.magnitude_multiplier"), multiplier)?;
        }
        Ok(())
    }
}

fn check_finite(field: String, value: f64) -> Result<(), CatalogError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CatalogError::InvalidValue { field, value })
    }
}

fn check_non_negative(field: String, value: f64) -> Result<(), CatalogError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CatalogError::InvalidValue { field, value })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolTierDef {
    pub name: String,
    pub cost: u64,
    /// When set the tier is bought with premium currency instead of coins
    #[serde(default)]
    pub premium_cost: Option<u64>,
    #[serde(default)]
    pub luck: f64,
    /// Extra challenge keys the tool demands
    #[serde(default)]
    pub length_add: u32,
    /// Seconds removed from the challenge timeout
    #[serde(default)]
    pub timeout_penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessoryDef {
    pub name: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub buffs: Buffs,
    #[serde(default = "yes")]
    pub sellable: bool,
    #[serde(default)]
    pub sell_premium: u64,
    #[serde(default)]
    pub buy_premium: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionDef {
    pub name: String,
    #[serde(default)]
    pub tag: String,
    pub rarity: Rarity,
    #[serde(default)]
    pub buffs: Buffs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncubationTierDef {
    pub price: u64,
    pub duration_secs: i64,
    /// Companion ids that can hatch from this tier
    pub pool: Vec<String>,
}

/// Multipliers a weather applies to every catch while active
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherBuffs {
    pub luck: f64,
    pub magnitude_multiplier: f64,
    pub shiny_multiplier: f64,
    pub secondary_multiplier: f64,
}

impl Default for WeatherBuffs {
    fn default() -> Self {
        Self {
            luck: 0.0,
            magnitude_multiplier: 1.0,
            shiny_multiplier: 1.0,
            secondary_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventVariantDef {
    pub species: SpeciesDef,
    /// Explicit per-catch chance; derived from the pool size when absent
    #[serde(default)]
    pub chance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherDef {
    pub name: String,
    pub duration_secs: u64,
    /// Relative selection weight for the weather scheduler
    pub rate: f64,
    #[serde(default)]
    pub buffs: WeatherBuffs,
    #[serde(default)]
    pub event_variants: BTreeMap<Rarity, Vec<EventVariantDef>>,
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub rarities: BTreeMap<Rarity, RarityTierDef>,
    pub species: BTreeMap<Rarity, Vec<SpeciesDef>>,
    pub tools: BTreeMap<u32, ToolTierDef>,
    #[serde(default)]
    pub accessories: BTreeMap<String, AccessoryDef>,
    #[serde(default)]
    pub companions: BTreeMap<String, CompanionDef>,
    #[serde(default)]
    pub incubation_tiers: BTreeMap<u32, IncubationTierDef>,
    #[serde(default)]
    pub companion_rarity_weights: BTreeMap<Rarity, f64>,
    #[serde(default)]
    pub weathers: BTreeMap<String, WeatherDef>,
    #[serde(default)]
    pub secondary_rewards: BTreeMap<Rarity, u64>,
}

impl Catalog {
    /// Load a catalog file, picking the format from its extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let catalog: Catalog = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&text)?,
            Some("ron") => ron::from_str(&text)?,
            _ => return Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
        };
        catalog.validate()?;
        info!(
            "Loaded catalog from {:?}: {} tiers, {} species, {} tools, {} weathers",
            path,
            catalog.rarities.len(),
            catalog.species_count(),
            catalog.tools.len(),
            catalog.weathers.len()
        );
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn species_count(&self) -> usize {
        self.species.values().map(Vec::len).sum()
    }

    pub fn species_pool(&self, tier: Rarity) -> &[SpeciesDef] {
        self.species.get(&tier).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tier(&self, tier: Rarity) -> Result<&RarityTierDef, CatalogError> {
        self.rarities.get(&tier).ok_or(CatalogError::UnknownRarity(tier))
    }

    pub fn tool(&self, level: u32) -> Option<&ToolTierDef> {
        self.tools.get(&level)
    }

    pub fn max_tool_level(&self) -> u32 {
        self.tools.keys().next_back().copied().unwrap_or(1)
    }

    pub fn secondary_reward(&self, tier: Rarity) -> u64 {
        self.secondary_rewards.get(&tier).copied().unwrap_or(0)
    }

    /// Reject content that would make a later lookup fail at catch time
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.rarities.is_empty() {
            return Err(CatalogError::MissingTable("rarities"));
        }
        if self.species.is_empty() {
            return Err(CatalogError::MissingTable("species"));
        }
        if self.tools.is_empty() {
            return Err(CatalogError::MissingTable("tools"));
        }

        let mut total = 0.0;
        for (rarity, def) in &self.rarities {
            if !(def.base_weight.is_finite() && def.base_weight >= 0.0) {
                return Err(CatalogError::InvalidValue {
                    field: format!("rarities.{rarity}.base_weight"),
                    value: def.base_weight,
                });
            }
            let (lo, hi) = def.magnitude_range;
            if !(lo > 0.0 && lo <= hi) {
                return Err(CatalogError::InvalidValue {
                    field: format!("rarities.{rarity}.magnitude_range"),
                    value: lo,
                });
            }
            if self.species_pool(*rarity).is_empty() {
                return Err(CatalogError::EmptySpeciesPool(*rarity));
            }
            total += def.base_weight;
        }
        if total <= 0.0 {
            return Err(CatalogError::ZeroTotalWeight { luck: 0.0 });
        }

        for (rarity, pool) in &self.species {
            if !self.rarities.contains_key(rarity) {
                return Err(CatalogError::UnknownRarity(*rarity));
            }
            if pool.iter().map(SpeciesDef::effective_rate).sum::<f64>() <= 0.0 {
                return Err(CatalogError::InvalidWeights {
                    table: "species",
                    reason: format!("all rates in the `{rarity}` pool are zero"),
                });
            }
        }

        for expected in 1..=self.max_tool_level() {
            if !self.tools.contains_key(&expected) {
                return Err(CatalogError::ToolTierGap(expected));
            }
        }

        for (level, tool) in &self.tools {
            check_finite(format!("tools.{level}.luck"), tool.luck)?;
            check_non_negative(format!("tools.{level}.timeout_penalty"), tool.timeout_penalty)?;
        }
        for (id, accessory) in &self.accessories {
            accessory.buffs.validate(&format!("accessories.{id}.buffs"))?;
        }
        for (id, companion) in &self.companions {
            companion.buffs.validate(&format!("companions.{id}.buffs"))?;
        }

        for (tier, def) in &self.incubation_tiers {
            if def.pool.is_empty() {
                return Err(CatalogError::InvalidWeights {
                    table: "incubation_tiers",
                    reason: format!("tier {tier} has an empty pool"),
                });
            }
            for id in &def.pool {
                if !self.companions.contains_key(id) {
                    return Err(CatalogError::UnknownCompanion(id.clone()));
                }
            }
        }

        for (name, weather) in &self.weathers {
            if !(weather.rate.is_finite() && weather.rate >= 0.0) {
                return Err(CatalogError::InvalidValue {
                    field: format!("weathers.{name}.rate"),
                    value: weather.rate,
                });
            }
            for rarity in weather.event_variants.keys() {
                if !self.rarities.contains_key(rarity) {
                    return Err(CatalogError::UnknownRarity(*rarity));
                }
            }
        }
        if !self.weathers.is_empty() && self.weathers.values().all(|w| w.rate <= 0.0) {
            return Err(CatalogError::InvalidWeights {
                table: "weathers",
                reason: "every weather has zero rate".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalog_validates() {
        let catalog = Catalog::builtin();
        catalog.validate().unwrap();
        assert_eq!(catalog.rarities.len(), 8);
        assert_eq!(catalog.max_tool_level(), 7);
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        let mut catalog = Catalog::builtin();
        catalog.species.insert(Rarity::Epic, Vec::new());
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::EmptySpeciesPool(Rarity::Epic))
        ));
    }

    #[test]
    fn test_tool_gap_is_rejected() {
        let mut catalog = Catalog::builtin();
        catalog.tools.remove(&3);
        assert!(matches!(catalog.validate(), Err(CatalogError::ToolTierGap(3))));
    }

    #[test]
    fn test_unbounded_buffs_are_rejected() {
        let mut catalog = Catalog::builtin();
        let id = catalog.accessories.keys().next().cloned().unwrap();
        catalog.accessories.get_mut(&id).unwrap().buffs.timeout_bonus = f64::INFINITY;
        match catalog.validate() {
            Err(CatalogError::InvalidValue { field, .. }) => {
                assert_eq!(field, format!("accessories.{id}.buffs.timeout_bonus"))
            }
            other => panic!("infinite timeout bonus must be rejected, got {:?}", other),
        }

        let mut catalog = Catalog::builtin();
        let id = catalog.companions.keys().next().cloned().unwrap();
        catalog.companions.get_mut(&id).unwrap().buffs.timeout_bonus = -2.0;
        assert!(
            matches!(catalog.validate(), Err(CatalogError::InvalidValue { .. })),
            "negative timeout bonus must be rejected"
        );

        let mut catalog = Catalog::builtin();
        catalog.tools.get_mut(&1).unwrap().timeout_penalty = f64::NAN;
        assert!(matches!(catalog.validate(), Err(CatalogError::InvalidValue { .. })));
    }

    #[test]
    fn test_dangling_companion_in_incubation_pool() {
        let mut catalog = Catalog::builtin();
        catalog
            .incubation_tiers
            .get_mut(&1)
            .unwrap()
            .pool
            .push("ghost".to_string());
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::UnknownCompanion(id)) if id == "ghost"
        ));
    }

    #[test]
    fn test_missing_rarities_table() {
        let mut catalog = Catalog::builtin();
        catalog.rarities.clear();
        assert!(matches!(catalog.validate(), Err(CatalogError::MissingTable("rarities"))));
    }

    #[test]
    fn test_secondary_reward_defaults_to_zero() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.secondary_reward(Rarity::Common), 0);
        assert_eq!(catalog.secondary_reward(Rarity::Unreal), 50);
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let json = Catalog::builtin().to_json().unwrap();
        std::fs::File::create(&path)
            .unwrap()
            .write_all(json.as_bytes())
            .unwrap();

        let loaded = Catalog::load(&path).unwrap();
        let builtin = Catalog::builtin();
        assert_eq!(loaded.species_count(), builtin.species_count());
        assert_eq!(loaded.tools.keys().collect::<Vec<_>>(), builtin.tools.keys().collect::<Vec<_>>());
        assert_eq!(loaded.secondary_rewards, builtin.secondary_rewards);
    }

    #[test]
    fn test_load_ron_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.ron");
        let text = ron::ser::to_string_pretty(&Catalog::builtin(), Default::default()).unwrap();
        std::fs::write(&path, text).unwrap();

        let loaded = Catalog::load(&path).unwrap();
        assert_eq!(loaded.species_count(), Catalog::builtin().species_count());
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(&path, "rarities: {}").unwrap();
        assert!(matches!(
            Catalog::load(&path),
            Err(CatalogError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_load_rejects_broken_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let mut catalog = Catalog::builtin();
        catalog.tools.clear();
        std::fs::write(&path, serde_json::to_string(&catalog).unwrap()).unwrap();
        assert!(matches!(Catalog::load(&path), Err(CatalogError::MissingTable("tools"))));
    }
}
