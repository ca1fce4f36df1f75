//! Tunable pipeline parameters.
//!
//! Every field has a default matching live balance; server config can embed a
//! partial override because all fields fall back through `#[serde(default)]`.

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::magnitude::SizeClass;

/// One discrete size class: its sampling probability and the percentage band
/// of the species' base magnitude it draws from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeClassBand {
    pub class: SizeClass,
    pub probability: f64,
    pub pct_low: f64,
    pub pct_high: f64,
}

/// Base timed-challenge parameters before modifiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeConfig {
    pub len_min: usize,
    pub len_max: usize,
    pub timeout_secs: f64,
    pub min_timeout_secs: f64,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            len_min: 4,
            len_max: 5,
            timeout_secs: 10.0,
            min_timeout_secs: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Luck every player has before any modifier
    pub base_luck: f64,
    pub base_shiny_probability: f64,
    pub shiny_value_multiplier: f64,
    /// Scale applied to `1 / poolSize` when an event variant has no explicit chance
    pub event_vs_normal_scale: f64,
    /// An explicit variant chance is capped at `cap / poolSize`
    pub explicit_event_chance_cap: f64,
    pub inventory_cap: usize,
    pub incubation_limit: usize,
    pub xp_per_catch: u64,
    pub base_xp_per_level: u64,
    pub level_up_premium_per_level: u64,
    /// When set, a catch's reward value is credited to currency on capture
    /// and selling it pays nothing; otherwise the value is paid on sale
    pub credit_catch_value: bool,
    pub item_drop_chance: f64,
    pub size_classes: Vec<SizeClassBand>,
    pub challenge: ChallengeConfig,
    pub daily_coins: (u64, u64),
    pub daily_premium: (u64, u64),
    /// Fraction of a tank entry's value paid per hour on display
    pub tank_income_rate_per_hour: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_luck: 0.0,
            base_shiny_probability: 0.001,
            shiny_value_multiplier: 20.0,
            event_vs_normal_scale: 0.8,
            explicit_event_chance_cap: 0.95,
            inventory_cap: 40,
            incubation_limit: 3,
            xp_per_catch: 10,
            base_xp_per_level: 100,
            level_up_premium_per_level: 15,
            credit_catch_value: true,
            item_drop_chance: crate::constants::ITEM_DROP_CHANCE,
            size_classes: default_size_classes(),
            challenge: ChallengeConfig::default(),
            daily_coins: (100, 400),
            daily_premium: (40, 50),
            tank_income_rate_per_hour: 0.05,
        }
    }
}

pub fn default_size_classes() -> Vec<SizeClassBand> {
    vec![
        SizeClassBand {
            class: SizeClass::Tiny,
            probability: 0.15,
            pct_low: 0.5,
            pct_high: 0.7,
        },
        SizeClassBand {
            class: SizeClass::Normal,
            probability: 0.60,
            pct_low: 0.9,
            pct_high: 1.1,
        },
        SizeClassBand {
            class: SizeClass::Huge,
            probability: 0.23,
            pct_low: 1.5,
            pct_high: 2.5,
        },
        SizeClassBand {
            class: SizeClass::Gigantic,
            probability: 0.02,
            pct_low: 5.0,
            pct_high: 7.0,
        },
    ]
}

fn check(field: &str, value: f64, ok: bool) -> Result<(), CatalogError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(CatalogError::InvalidValue {
            field: field.to_string(),
            value,
        })
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the pipeline misbehave at runtime
    pub fn validate(&self) -> Result<(), CatalogError> {
        let p = self.base_shiny_probability;
        check("base_shiny_probability", p, (0.0..=1.0).contains(&p))?;
        check("shiny_value_multiplier", self.shiny_value_multiplier, self.shiny_value_multiplier >= 0.0)?;
        check("event_vs_normal_scale", self.event_vs_normal_scale, self.event_vs_normal_scale >= 0.0)?;
        check(
            "explicit_event_chance_cap",
            self.explicit_event_chance_cap,
            self.explicit_event_chance_cap >= 0.0,
        )?;
        check("item_drop_chance", self.item_drop_chance, (0.0..=1.0).contains(&self.item_drop_chance))?;
        check("inventory_cap", self.inventory_cap as f64, self.inventory_cap > 0)?;
        check("base_xp_per_level", self.base_xp_per_level as f64, self.base_xp_per_level > 0)?;
        check(
            "tank_income_rate_per_hour",
            self.tank_income_rate_per_hour,
            self.tank_income_rate_per_hour >= 0.0,
        )?;

        if self.size_classes.is_empty() {
            return Err(CatalogError::MissingTable("size_classes"));
        }
        let total: f64 = self.size_classes.iter().map(|b| b.probability).sum();
        check("size_classes.probability", total, total > 0.0)?;
        for band in &self.size_classes {
            check("size_classes.probability", band.probability, band.probability >= 0.0)?;
            check(
                "size_classes.pct_low",
                band.pct_low,
                band.pct_low > 0.0 && band.pct_low <= band.pct_high,
            )?;
        }

        let c = &self.challenge;
        check("challenge.len_min", c.len_min as f64, c.len_min > 0 && c.len_min <= c.len_max)?;
        check("challenge.min_timeout_secs", c.min_timeout_secs, c.min_timeout_secs > 0.0)?;
        check("daily_coins", self.daily_coins.0 as f64, self.daily_coins.0 <= self.daily_coins.1)?;
        check(
            "daily_premium",
            self.daily_premium.0 as f64,
            self.daily_premium.0 <= self.daily_premium.1,
        )?;
        Ok(())
    }
}
