//! World state snapshots (weather and events).
//!
//! A single scheduler owns weather transitions and publishes a new
//! [`WorldState`] each time; the pipeline only ever sees an immutable snapshot
//! passed in by the caller.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{Catalog, EventVariantDef, WeatherDef};
use crate::rarity::Rarity;

pub const CLEAR_WEATHER_ID: &str = "clear";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub weather_id: String,
    pub name: String,
    pub luck_bonus: f64,
    pub magnitude_multiplier: f64,
    pub shiny_multiplier: f64,
    pub secondary_multiplier: f64,
    pub event_variants: BTreeMap<Rarity, Vec<EventVariantDef>>,
    /// Epoch second the snapshot expires; `None` for an open-ended state
    pub ends_at: Option<i64>,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::clear()
    }
}

/// Multipliers that are absent, zero or negative are a no-op
fn neutral(m: f64) -> f64 {
    if m.is_finite() && m > 0.0 {
        m
    } else {
        1.0
    }
}

impl WorldState {
    /// Neutral snapshot: no luck, all multipliers 1, no event variants
    pub fn clear() -> Self {
        Self {
            weather_id: CLEAR_WEATHER_ID.to_string(),
            name: "Clear Skies".to_string(),
            luck_bonus: 0.0,
            magnitude_multiplier: 1.0,
            shiny_multiplier: 1.0,
            secondary_multiplier: 1.0,
            event_variants: BTreeMap::new(),
            ends_at: None,
        }
    }

    pub fn from_weather(id: &str, def: &WeatherDef, started_at: i64) -> Self {
        Self {
            weather_id: id.to_string(),
            name: def.name.clone(),
            luck_bonus: def.buffs.luck,
            magnitude_multiplier: neutral(def.buffs.magnitude_multiplier),
            shiny_multiplier: neutral(def.buffs.shiny_multiplier),
            secondary_multiplier: neutral(def.buffs.secondary_multiplier),
            event_variants: def.event_variants.clone(),
            ends_at: Some(started_at.saturating_add(def.duration_secs as i64)),
        }
    }

    pub fn variants_for(&self, tier: Rarity) -> &[EventVariantDef] {
        self.event_variants
            .get(&tier)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn remaining_secs(&self, now: i64) -> Option<i64> {
        self.ends_at.map(|end| (end - now).max(0))
    }

    pub fn magnitude_factor(&self) -> f64 {
        neutral(self.magnitude_multiplier)
    }

    pub fn shiny_factor(&self) -> f64 {
        neutral(self.shiny_multiplier)
    }

    pub fn secondary_factor(&self) -> f64 {
        neutral(self.secondary_multiplier)
    }
}

/// Pick the next weather weighted by each definition's `rate`.
/// Returns `None` when the catalog defines no selectable weather.
pub fn pick_weather<'a, R: Rng + ?Sized>(
    catalog: &'a Catalog,
    rng: &mut R,
) -> Option<(&'a str, &'a WeatherDef)> {
    let entries: Vec<(&String, &WeatherDef)> = catalog.weathers.iter().collect();
    let index = WeightedIndex::new(entries.iter().map(|(_, w)| w.rate.max(0.0))).ok()?;
    let (id, def) = entries[index.sample(rng)];
    Some((id.as_str(), def))
}
