//! Economic operations on player documents.
//!
//! Every operation runs inside one [`PlayerStore::mutate`] (or
//! [`PlayerStore::mutate_pair`]) call: it validates against the draft and
//! returns an [`EconomyError`] before touching anything, so a rejected
//! operation performs zero mutation and persists nothing.

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

use catch_core::constants::{ACCESSORY_SLOT_UNLOCK_LEVEL, DAILY_COOLDOWN_SECS, TANK_MIN_INCOME_SECS};
use catch_core::modifiers::companion_slot_bonus;
use catch_core::player::{generate_catch_id, Incubation, IncubationStatus, TankEntry};
use catch_core::progression::{
    accessory_slot_limit, active_companion_limit, apply_experience, tank_capacity, LevelUp,
};
use catch_core::{Catalog, CatalogError, PlayerDocument, Rarity};

use super::{PlayerId, PlayerStore, SamePlayer};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EconomyError {
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },
    #[error("insufficient premium currency: have {have}, need {need}")]
    InsufficientPremium { have: u64, need: u64 },
    #[error("no catch with id `{0}`")]
    UnknownCatch(String),
    #[error("no accessory `{0}`")]
    UnknownAccessory(String),
    #[error("no companion `{0}`")]
    UnknownCompanion(String),
    #[error("no incubation tier {0}")]
    UnknownIncubationTier(u32),
    #[error("no pending incubation `{0}`")]
    UnknownIncubation(String),
    #[error("no tool tier {0}")]
    UnknownTool(u32),
    #[error("not owned")]
    NotOwned,
    #[error("already equipped")]
    AlreadyEquipped,
    #[error("still equipped; unequip it first")]
    StillEquipped,
    #[error("already active")]
    AlreadyActive,
    #[error("not active")]
    NotActive,
    #[error("all {limit} slots are in use")]
    SlotsFull { limit: usize },
    #[error("requires level {required}")]
    LevelTooLow { required: u32 },
    #[error("display tank is full ({capacity})")]
    TankFull { capacity: usize },
    #[error("already in the display tank")]
    AlreadyInTank,
    #[error("not in the display tank")]
    NotInTank,
    #[error("trash cannot be displayed")]
    TrashNotDisplayable,
    #[error("cannot be sold")]
    NotSellable,
    #[error("not for sale")]
    NotForSale,
    #[error("incubation limit of {limit} reached")]
    IncubationLimit { limit: usize },
    #[error("not ready until {ready_at}")]
    NotReady { ready_at: i64 },
    #[error("tool tier not owned (highest owned: {max_owned})")]
    ToolNotOwned { max_owned: u32 },
    #[error("already at the highest tool tier")]
    MaxToolReached,
    #[error("daily reward available in {remaining_secs}s")]
    DailyCooldown { remaining_secs: i64 },
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("cannot transfer to yourself")]
    SelfTransfer,
    #[error("no equipped accessory in slot {0}")]
    InvalidSlot(usize),
    #[error("could not allocate a unique id")]
    IdSpaceExhausted,
    #[error("catalog error: {0}")]
    Catalog(String),
}

impl From<SamePlayer> for EconomyError {
    fn from(_: SamePlayer) -> Self {
        Self::SelfTransfer
    }
}

impl From<CatalogError> for EconomyError {
    fn from(e: CatalogError) -> Self {
        Self::Catalog(e.to_string())
    }
}

pub type EconomyResult<T> = Result<T, EconomyError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaleSummary {
    pub sold: usize,
    pub earned: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyReward {
    pub coins: u64,
    pub premium: u64,
}

// ============================================================================
// Balance helpers
// ============================================================================

fn debit(doc: &mut PlayerDocument, amount: u64) -> EconomyResult<()> {
    if doc.currency < amount {
        return Err(EconomyError::InsufficientFunds { have: doc.currency, need: amount });
    }
    doc.currency -= amount;
    Ok(())
}

fn debit_premium(doc: &mut PlayerDocument, amount: u64) -> EconomyResult<()> {
    if doc.premium_currency < amount {
        return Err(EconomyError::InsufficientPremium { have: doc.premium_currency, need: amount });
    }
    doc.premium_currency -= amount;
    Ok(())
}

fn apply_delta(value: u64, delta: i64) -> Option<u64> {
    if delta >= 0 {
        Some(value.saturating_add(delta as u64))
    } else {
        value.checked_sub(delta.unsigned_abs())
    }
}

/// Drop equipped accessories beyond the current slot limit
fn fit_accessories_to_slots(catalog: &Catalog, doc: &mut PlayerDocument) -> Vec<String> {
    let limit = accessory_slot_limit(doc.level, companion_slot_bonus(catalog, &doc.active_companions));
    if doc.equipped_accessories.len() > limit {
        doc.equipped_accessories.split_off(limit)
    } else {
        Vec::new()
    }
}

fn remove_catch(doc: &mut PlayerDocument, id: &str) -> EconomyResult<u64> {
    let index = doc
        .caught_objects
        .iter()
        .position(|c| c.id == id)
        .ok_or_else(|| EconomyError::UnknownCatch(id.to_string()))?;
    let catch = doc.caught_objects.remove(index);
    doc.display_tank.remove(id);
    Ok(catch.reward_value)
}

impl PlayerStore {
    // ========================================================================
    // Currency & experience
    // ========================================================================

    /// Add (or with a negative delta, take) coins; returns the new balance
    pub fn add_currency(&self, player: &PlayerId, delta: i64) -> EconomyResult<u64> {
        self.mutate(player, |doc| {
            doc.currency = apply_delta(doc.currency, delta).ok_or(EconomyError::InsufficientFunds {
                have: doc.currency,
                need: delta.unsigned_abs(),
            })?;
            Ok(doc.currency)
        })
    }

    pub fn add_premium_currency(&self, player: &PlayerId, delta: i64) -> EconomyResult<u64> {
        self.mutate(player, |doc| {
            doc.premium_currency =
                apply_delta(doc.premium_currency, delta).ok_or(EconomyError::InsufficientPremium {
                    have: doc.premium_currency,
                    need: delta.unsigned_abs(),
                })?;
            Ok(doc.premium_currency)
        })
    }

    pub fn grant_experience(&self, player: &PlayerId, amount: u64) -> LevelUp {
        let config = self.config.clone();
        let level_up = self.update(player, |doc| apply_experience(doc, amount, &config));
        if level_up.levels_gained > 0 {
            info!(
                "Player {} gained {} level(s), +{} premium",
                player, level_up.levels_gained, level_up.premium_awarded
            );
        }
        level_up
    }

    /// Move coins between two players
    pub fn transfer_currency(&self, from: &PlayerId, to: &PlayerId, amount: u64) -> EconomyResult<(u64, u64)> {
        if from == to {
            return Err(EconomyError::SelfTransfer);
        }
        if amount == 0 {
            return Err(EconomyError::InvalidAmount);
        }
        self.mutate_pair(from, to, |sender, receiver| {
            debit(sender, amount)?;
            receiver.currency = receiver.currency.saturating_add(amount);
            Ok((sender.currency, receiver.currency))
        })
    }

    // ========================================================================
    // Tools
    // ========================================================================

    pub fn equip_tool(&self, player: &PlayerId, level: u32) -> EconomyResult<()> {
        if self.catalog.tool(level).is_none() {
            return Err(EconomyError::UnknownTool(level));
        }
        self.mutate(player, |doc| {
            if level > doc.max_tool_level_owned {
                return Err(EconomyError::ToolNotOwned { max_owned: doc.max_tool_level_owned });
            }
            doc.tool_level = level;
            Ok(())
        })
    }

    /// Buy the next tool tier and equip it; returns the new tier
    pub fn purchase_next_tool(&self, player: &PlayerId) -> EconomyResult<u32> {
        let catalog = self.catalog.clone();
        self.mutate(player, |doc| {
            let next = doc.max_tool_level_owned + 1;
            let tool = catalog.tool(next).ok_or(EconomyError::MaxToolReached)?;
            match tool.premium_cost {
                Some(premium) => debit_premium(doc, premium)?,
                None => debit(doc, tool.cost)?,
            }
            doc.max_tool_level_owned = next;
            doc.tool_level = next;
            debug!("Player {} bought tool tier {} ({})", player, next, tool.name);
            Ok(next)
        })
    }

    // ========================================================================
    // Accessories
    // ========================================================================

    fn known_accessory(&self, id: &str) -> EconomyResult<()> {
        if self.catalog.accessories.contains_key(id) {
            Ok(())
        } else {
            Err(EconomyError::UnknownAccessory(id.to_string()))
        }
    }

    /// Returns the new owned count
    pub fn add_accessory(&self, player: &PlayerId, id: &str, qty: u32) -> EconomyResult<u32> {
        self.known_accessory(id)?;
        if qty == 0 {
            return Err(EconomyError::InvalidAmount);
        }
        self.mutate(player, |doc| {
            let count = doc.owned_accessories.entry(id.to_string()).or_insert(0);
            *count = count.saturating_add(qty);
            Ok(*count)
        })
    }

    /// Returns the remaining owned count
    pub fn remove_accessory(&self, player: &PlayerId, id: &str, qty: u32) -> EconomyResult<u32> {
        if qty == 0 {
            return Err(EconomyError::InvalidAmount);
        }
        self.mutate(player, |doc| take_accessories(doc, id, qty))
    }

    /// Buy with premium currency; returns the new owned count
    pub fn buy_accessory(&self, player: &PlayerId, id: &str, qty: u32) -> EconomyResult<u32> {
        let def = self
            .catalog
            .accessories
            .get(id)
            .ok_or_else(|| EconomyError::UnknownAccessory(id.to_string()))?;
        let price = def.buy_premium.ok_or(EconomyError::NotForSale)?;
        if qty == 0 {
            return Err(EconomyError::InvalidAmount);
        }
        self.mutate(player, |doc| {
            debit_premium(doc, price.saturating_mul(qty as u64))?;
            let count = doc.owned_accessories.entry(id.to_string()).or_insert(0);
            *count = count.saturating_add(qty);
            Ok(*count)
        })
    }

    /// Sell for premium currency; returns the premium earned
    pub fn sell_accessory(&self, player: &PlayerId, id: &str, qty: u32) -> EconomyResult<u64> {
        let def = self
            .catalog
            .accessories
            .get(id)
            .ok_or_else(|| EconomyError::UnknownAccessory(id.to_string()))?;
        if !def.sellable {
            return Err(EconomyError::NotSellable);
        }
        if qty == 0 {
            return Err(EconomyError::InvalidAmount);
        }
        let earned = def.sell_premium.saturating_mul(qty as u64);
        self.mutate(player, |doc| {
            take_accessories(doc, id, qty)?;
            doc.premium_currency = doc.premium_currency.saturating_add(earned);
            Ok(earned)
        })
    }

    pub fn equip_accessory(&self, player: &PlayerId, id: &str) -> EconomyResult<()> {
        self.known_accessory(id)?;
        let catalog = self.catalog.clone();
        self.mutate(player, |doc| {
            if doc.owned_accessory_count(id) == 0 {
                return Err(EconomyError::NotOwned);
            }
            if doc.equipped_accessories.iter().any(|a| a == id) {
                return Err(EconomyError::AlreadyEquipped);
            }
            let limit = accessory_slot_limit(doc.level, companion_slot_bonus(&catalog, &doc.active_companions));
            if limit == 0 {
                return Err(EconomyError::LevelTooLow { required: ACCESSORY_SLOT_UNLOCK_LEVEL });
            }
            if doc.equipped_accessories.len() >= limit {
                return Err(EconomyError::SlotsFull { limit });
            }
            doc.equipped_accessories.push(id.to_string());
            Ok(())
        })
    }

    /// Unequip by slot index; returns the accessory id
    pub fn unequip_accessory(&self, player: &PlayerId, slot: usize) -> EconomyResult<String> {
        self.mutate(player, |doc| {
            if slot >= doc.equipped_accessories.len() {
                return Err(EconomyError::InvalidSlot(slot));
            }
            Ok(doc.equipped_accessories.remove(slot))
        })
    }

    pub fn unequip_all_accessories(&self, player: &PlayerId) -> Vec<String> {
        self.update(player, |doc| std::mem::take(&mut doc.equipped_accessories))
    }

    // ========================================================================
    // Companions
    // ========================================================================

    fn known_companion(&self, id: &str) -> EconomyResult<()> {
        if self.catalog.companions.contains_key(id) {
            Ok(())
        } else {
            Err(EconomyError::UnknownCompanion(id.to_string()))
        }
    }

    pub fn add_companion(&self, player: &PlayerId, id: &str) -> EconomyResult<()> {
        self.known_companion(id)?;
        self.mutate(player, |doc| {
            doc.companions_owned.push(id.to_string());
            Ok(())
        })
    }

    /// Remove one owned copy; the last copy also leaves the active list
    pub fn remove_companion(&self, player: &PlayerId, id: &str) -> EconomyResult<()> {
        let catalog = self.catalog.clone();
        self.mutate(player, |doc| {
            let index = doc
                .companions_owned
                .iter()
                .position(|c| c == id)
                .ok_or(EconomyError::NotOwned)?;
            doc.companions_owned.remove(index);
            if doc.owned_companion_count(id) == 0 {
                doc.active_companions.retain(|c| c != id);
                fit_accessories_to_slots(&catalog, doc);
            }
            Ok(())
        })
    }

    pub fn activate_companion(&self, player: &PlayerId, id: &str) -> EconomyResult<()> {
        self.known_companion(id)?;
        self.mutate(player, |doc| {
            if doc.owned_companion_count(id) == 0 {
                return Err(EconomyError::NotOwned);
            }
            if doc.active_companions.iter().any(|c| c == id) {
                return Err(EconomyError::AlreadyActive);
            }
            let limit = active_companion_limit(doc.level);
            if doc.active_companions.len() >= limit {
                return Err(EconomyError::SlotsFull { limit });
            }
            doc.active_companions.push(id.to_string());
            Ok(())
        })
    }

    /// Returns accessories unequipped because a slot-granting companion left
    pub fn deactivate_companion(&self, player: &PlayerId, id: &str) -> EconomyResult<Vec<String>> {
        let catalog = self.catalog.clone();
        self.mutate(player, |doc| {
            let index = doc
                .active_companions
                .iter()
                .position(|c| c == id)
                .ok_or(EconomyError::NotActive)?;
            doc.active_companions.remove(index);
            Ok(fit_accessories_to_slots(&catalog, doc))
        })
    }

    /// Returns the companions that were active
    pub fn deactivate_all_companions(&self, player: &PlayerId) -> Vec<String> {
        let catalog = self.catalog.clone();
        self.update(player, |doc| {
            let previous = std::mem::take(&mut doc.active_companions);
            fit_accessories_to_slots(&catalog, doc);
            previous
        })
    }

    // ========================================================================
    // Incubation
    // ========================================================================

    pub fn start_incubation<R: Rng + ?Sized>(
        &self,
        player: &PlayerId,
        tier: u32,
        now: i64,
        rng: &mut R,
    ) -> EconomyResult<Incubation> {
        let def = self
            .catalog
            .incubation_tiers
            .get(&tier)
            .ok_or(EconomyError::UnknownIncubationTier(tier))?;
        let limit = self.config.incubation_limit;

        self.mutate(player, |doc| {
            if doc.pending_incubations.len() >= limit {
                return Err(EconomyError::IncubationLimit { limit });
            }
            debit(doc, def.price)?;
            let id = generate_catch_id(rng, |candidate| {
                doc.pending_incubations.iter().any(|i| i.id == candidate)
            })
            .ok_or(EconomyError::IdSpaceExhausted)?;
            let incubation = Incubation {
                id,
                tier,
                ready_at_epoch: now + def.duration_secs,
                started_at_epoch: now,
            };
            doc.pending_incubations.push(incubation.clone());
            Ok(incubation)
        })
    }

    /// Derived from the clock; never mutates
    pub fn incubation_status(&self, player: &PlayerId, now: i64) -> Vec<(Incubation, IncubationStatus)> {
        self.read(player, |doc| {
            doc.pending_incubations
                .iter()
                .map(|inc| (inc.clone(), inc.status(now)))
                .collect()
        })
    }

    /// Hatch a ready incubation into a companion; returns the companion id
    pub fn hatch<R: Rng + ?Sized>(
        &self,
        player: &PlayerId,
        incubation_id: &str,
        now: i64,
        rng: &mut R,
    ) -> EconomyResult<String> {
        let catalog = self.catalog.clone();
        let companion = self.mutate(player, |doc| {
            let index = doc
                .pending_incubations
                .iter()
                .position(|i| i.id == incubation_id)
                .ok_or_else(|| EconomyError::UnknownIncubation(incubation_id.to_string()))?;
            let incubation = &doc.pending_incubations[index];
            if let IncubationStatus::Incubating { .. } = incubation.status(now) {
                return Err(EconomyError::NotReady { ready_at: incubation.ready_at_epoch });
            }

            let companion = pick_hatchling(&catalog, incubation.tier, rng)?;
            doc.pending_incubations.remove(index);
            doc.companions_owned.push(companion.clone());
            Ok(companion)
        })?;
        info!("Player {} hatched companion {}", player, companion);
        Ok(companion)
    }

    // ========================================================================
    // Selling catches
    // ========================================================================

    /// Coins a sale pays for a catch worth `reward_value`.
    ///
    /// A catch is paid exactly once: on capture when `credit_catch_value` is
    /// set, otherwise on sale.
    fn sale_payout(&self, reward_value: u64) -> u64 {
        if self.config.credit_catch_value {
            0
        } else {
            reward_value
        }
    }

    /// Returns the coins earned
    pub fn sell_catch(&self, player: &PlayerId, id: &str) -> EconomyResult<u64> {
        self.mutate(player, |doc| {
            let earned = self.sale_payout(remove_catch(doc, id)?);
            doc.currency = doc.currency.saturating_add(earned);
            doc.prune_tank();
            Ok(earned)
        })
    }

    /// All-or-nothing batch sale
    pub fn sell_catches(&self, player: &PlayerId, ids: &[String]) -> EconomyResult<SaleSummary> {
        let unique: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.mutate(player, |doc| {
            let mut summary = SaleSummary::default();
            for id in &unique {
                summary.earned = summary.earned.saturating_add(self.sale_payout(remove_catch(doc, id)?));
                summary.sold += 1;
            }
            doc.currency = doc.currency.saturating_add(summary.earned);
            doc.prune_tank();
            Ok(summary)
        })
    }

    /// Sell everything outside the display tank, keeping the `keep_per_tier`
    /// most valuable catches of each tier
    pub fn sell_all(&self, player: &PlayerId, keep_per_tier: usize) -> SaleSummary {
        self.update(player, |doc| {
            let mut by_tier: BTreeMap<Rarity, Vec<(u64, String)>> = BTreeMap::new();
            for catch in &doc.caught_objects {
                if doc.display_tank.contains_key(&catch.id) {
                    continue;
                }
                by_tier
                    .entry(catch.rarity_tier)
                    .or_default()
                    .push((catch.reward_value, catch.id.clone()));
            }

            let mut to_sell: HashSet<String> = HashSet::new();
            for catches in by_tier.values_mut() {
                catches.sort_by(|a, b| b.0.cmp(&a.0));
                to_sell.extend(catches.iter().skip(keep_per_tier).map(|(_, id)| id.clone()));
            }

            let mut summary = SaleSummary::default();
            doc.caught_objects.retain(|c| {
                if to_sell.contains(&c.id) {
                    summary.sold += 1;
                    summary.earned = summary.earned.saturating_add(self.sale_payout(c.reward_value));
                    false
                } else {
                    true
                }
            });
            doc.currency = doc.currency.saturating_add(summary.earned);
            doc.prune_tank();
            summary
        })
    }

    // ========================================================================
    // Display tank
    // ========================================================================

    pub fn place_in_tank(&self, player: &PlayerId, id: &str, now: i64) -> EconomyResult<()> {
        self.mutate(player, |doc| {
            let catch = doc.find_catch(id).ok_or_else(|| EconomyError::UnknownCatch(id.to_string()))?;
            if catch.rarity_tier == Rarity::Trash {
                return Err(EconomyError::TrashNotDisplayable);
            }
            if doc.in_tank(id) {
                return Err(EconomyError::AlreadyInTank);
            }
            let capacity = tank_capacity(doc.level);
            if doc.valid_tank_len() >= capacity {
                return Err(EconomyError::TankFull { capacity });
            }
            doc.prune_tank();
            doc.display_tank.insert(id.to_string(), TankEntry { placed_at_epoch: now });
            Ok(())
        })
    }

    pub fn remove_from_tank(&self, player: &PlayerId, id: &str) -> EconomyResult<()> {
        self.mutate(player, |doc| {
            if !doc.in_tank(id) {
                return Err(EconomyError::NotInTank);
            }
            doc.display_tank.remove(id);
            doc.prune_tank();
            Ok(())
        })
    }

    /// Pay out income for every entry at least a minute old; returns coins
    pub fn collect_tank_income(&self, player: &PlayerId, now: i64) -> u64 {
        let rate = self.config.tank_income_rate_per_hour;
        self.update(player, |doc| {
            doc.prune_tank();
            let mut total = 0u64;
            let values: BTreeMap<String, u64> = doc
                .valid_tank_entries()
                .map(|(catch, _)| (catch.id.clone(), catch.reward_value))
                .collect();

            for (id, entry) in doc.display_tank.iter_mut() {
                let age = now - entry.placed_at_epoch;
                if age < TANK_MIN_INCOME_SECS {
                    continue;
                }
                let value = values.get(id).copied().unwrap_or(0);
                let hours = age as f64 / 3600.0;
                total = total.saturating_add((value as f64 * rate * hours).floor().max(0.0) as u64);
                entry.placed_at_epoch = now;
            }

            doc.currency = doc.currency.saturating_add(total);
            total
        })
    }

    // ========================================================================
    // Daily claim
    // ========================================================================

    pub fn claim_daily<R: Rng + ?Sized>(&self, player: &PlayerId, now: i64, rng: &mut R) -> EconomyResult<DailyReward> {
        let (coins_lo, coins_hi) = self.config.daily_coins;
        let (premium_lo, premium_hi) = self.config.daily_premium;
        self.mutate(player, |doc| {
            let elapsed = now - doc.last_daily_claim_epoch;
            if doc.last_daily_claim_epoch > 0 && elapsed < DAILY_COOLDOWN_SECS {
                return Err(EconomyError::DailyCooldown {
                    remaining_secs: DAILY_COOLDOWN_SECS - elapsed,
                });
            }
            let reward = DailyReward {
                coins: rng.gen_range(coins_lo.min(coins_hi)..=coins_hi.max(coins_lo)),
                premium: rng.gen_range(premium_lo.min(premium_hi)..=premium_hi.max(premium_lo)),
            };
            doc.currency = doc.currency.saturating_add(reward.coins);
            doc.premium_currency = doc.premium_currency.saturating_add(reward.premium);
            doc.last_daily_claim_epoch = now;
            Ok(reward)
        })
    }
}

fn take_accessories(doc: &mut PlayerDocument, id: &str, qty: u32) -> EconomyResult<u32> {
    let owned = doc.owned_accessory_count(id);
    if owned < qty {
        return Err(EconomyError::NotOwned);
    }
    let remaining = owned - qty;
    if remaining == 0 && doc.equipped_accessories.iter().any(|a| a == id) {
        return Err(EconomyError::StillEquipped);
    }
    if remaining == 0 {
        doc.owned_accessories.remove(id);
    } else {
        doc.owned_accessories.insert(id.to_string(), remaining);
    }
    Ok(remaining)
}

/// Weighted pick from an incubation tier's pool by companion rarity weight
fn pick_hatchling<R: Rng + ?Sized>(catalog: &Catalog, tier: u32, rng: &mut R) -> EconomyResult<String> {
    let def = catalog
        .incubation_tiers
        .get(&tier)
        .ok_or(CatalogError::UnknownIncubationTier(tier))?;

    let mut weights = Vec::with_capacity(def.pool.len());
    for id in &def.pool {
        let companion = catalog
            .companions
            .get(id)
            .ok_or_else(|| CatalogError::UnknownCompanion(id.clone()))?;
        weights.push(catalog.companion_rarity_weights.get(&companion.rarity).copied().unwrap_or(0.0));
    }

    let dist = WeightedIndex::new(&weights).map_err(|e| CatalogError::InvalidWeights {
        table: "companion_rarity_weights",
        reason: e.to_string(),
    })?;
    Ok(def.pool[dist.sample(rng)].clone())
}
