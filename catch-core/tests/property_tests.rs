//! Property-based tests using proptest
//!
//! Invariants that must hold for ALL inputs:
//! - Valuation: non-negative, deterministic
//! - Magnitude: 2 decimal places, inside its size-class band
//! - Rarity weights: never negative, luck shifts mass to responsive tiers
//! - Progression: levels and XP never go backwards
//! - Catch ids and challenge input normalisation

use proptest::prelude::*;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use catch_core::catalog::{RarityTierDef, SpeciesDef};
use catch_core::challenge::normalize_input;
use catch_core::config::SizeClassBand;
use catch_core::magnitude::{base_magnitude, resolve_magnitude, round2};
use catch_core::player::generate_catch_id;
use catch_core::progression::apply_experience;
use catch_core::rarity::{distribution, effective_weight};
use catch_core::species::ResolvedSpecies;
use catch_core::valuation::{reward_value, valuate};
use catch_core::{Catalog, PipelineConfig, PlayerDocument, Rarity, WorldState};

fn species(base: f64, price: u64) -> ResolvedSpecies {
    ResolvedSpecies {
        name: "Perch".into(),
        tag: String::new(),
        tier: Rarity::Common,
        base_magnitude: Some(base),
        unit_price: Some(price),
        shiny_multiplier: 1.0,
        is_event_variant: false,
    }
}

// ============================================================
// Valuation Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prop_reward_value_never_negative(
        price in 0u64..1_000_000,
        magnitude in -100.0f64..10_000.0,
        shiny in any::<bool>(),
        mult in -5.0f64..50.0,
    ) {
        let v = reward_value(price, magnitude, shiny, mult);
        if magnitude <= 0.0 {
            prop_assert_eq!(v, 0);
        }
        // floor never exceeds the raw product by more than the epsilon slack
        let raw = price as f64 * magnitude * if shiny { mult } else { 1.0 };
        prop_assert!((v as f64) <= raw.max(0.0) + 1e-6, "value {v} above raw {raw}");
    }

    #[test]
    fn prop_valuation_is_deterministic(
        price in 1u64..100_000,
        magnitude in 0.01f64..1_000.0,
        shiny in any::<bool>(),
    ) {
        let catalog = Catalog::builtin();
        let config = PipelineConfig::default();
        let s = species(1.0, price);
        let world = WorldState::clear();
        let a = valuate(&catalog, &config, &s, magnitude, shiny, Rarity::Epic, &world).unwrap();
        let b = valuate(&catalog, &config, &s, magnitude, shiny, Rarity::Epic, &world).unwrap();
        prop_assert_eq!(a, b);
    }
}

// ============================================================
// Magnitude Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prop_magnitude_is_two_decimal_and_in_band(
        seed in any::<u64>(),
        base in 0.1f64..2_000.0,
        world_mult in 0.5f64..3.0,
        loadout_mult in 0.5f64..3.0,
    ) {
        let catalog = Catalog::builtin();
        let config = PipelineConfig::default();
        let tier = &catalog.rarities[&Rarity::Common];
        let world = WorldState { magnitude_multiplier: world_mult, ..WorldState::clear() };
        let s = species(base, 10);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

        let m = resolve_magnitude(&config, &s, tier, &world, loadout_mult, &mut rng).unwrap();
        prop_assert_eq!(round2(m.value), m.value, "value {} is not 2dp", m.value);

        let band: &SizeClassBand = config
            .size_classes
            .iter()
            .find(|b| b.class == m.size_class)
            .unwrap();
        let scale = base_magnitude(&s, tier) * world_mult * loadout_mult;
        let lo = scale * band.pct_low - 0.005;
        let hi = scale * band.pct_high + 0.005;
        prop_assert!(m.value >= lo && m.value <= hi, "{} outside [{lo}, {hi}]", m.value);
    }
}

// ============================================================
// Rarity Properties
// ============================================================

fn two_tier(responsive_factor: f64) -> Catalog {
    let mut catalog = Catalog::builtin();
    catalog.rarities.clear();
    catalog.rarities.insert(
        Rarity::Common,
        RarityTierDef { base_weight: 1_000.0, luck_factor: 0.0, unit_price: 10, magnitude_range: (0.2, 1.5) },
    );
    catalog.rarities.insert(
        Rarity::Epic,
        RarityTierDef { base_weight: 50.0, luck_factor: responsive_factor, unit_price: 500, magnitude_range: (2.0, 10.0) },
    );
    catalog
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn prop_weights_never_negative(
        base in 0.0f64..100_000.0,
        factor in -50.0f64..50.0,
        luck in -1_000.0f64..1_000.0,
    ) {
        let def = RarityTierDef { base_weight: base, luck_factor: factor, unit_price: 1, magnitude_range: (1.0, 2.0) };
        prop_assert!(effective_weight(&def, luck) >= 0.0);
    }

    #[test]
    fn prop_more_luck_favours_responsive_tiers(
        factor in 0.01f64..50.0,
        luck in 0.0f64..500.0,
        delta in 0.5f64..100.0,
    ) {
        let catalog = two_tier(factor);
        let low = distribution(&catalog, luck).unwrap();
        let high = distribution(&catalog, luck + delta).unwrap();
        let p = |d: &[(Rarity, f64)]| d.iter().find(|(r, _)| *r == Rarity::Epic).map(|(_, p)| *p).unwrap();
        prop_assert!(p(&high) > p(&low), "P(epic) {} -> {} did not increase", p(&low), p(&high));
    }
}

// ============================================================
// Progression, ids and input
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_experience_is_monotonic(grants in prop::collection::vec(0u64..5_000, 1..20)) {
        let config = PipelineConfig::default();
        let mut doc = PlayerDocument::default();
        let mut total_premium = 0;
        for amount in grants {
            let before = doc.level;
            let up = apply_experience(&mut doc, amount, &config);
            prop_assert!(doc.level >= before);
            prop_assert_eq!(doc.level, before + up.levels_gained);
            prop_assert!(doc.experience < config.base_xp_per_level * doc.level as u64);
            total_premium += up.premium_awarded;
        }
        prop_assert_eq!(doc.premium_currency, total_premium);
    }

    #[test]
    fn prop_catch_ids_are_short_alphanumeric(seed in any::<u64>()) {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let id = generate_catch_id(&mut rng, |_| false).unwrap();
        prop_assert_eq!(id.len(), 4);
        prop_assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn prop_normalize_is_idempotent(input in ".{0,40}") {
        let once = normalize_input(&input);
        prop_assert_eq!(normalize_input(&once), once.clone());
        prop_assert!(once.chars().all(|c| "dfjk".contains(c)));
    }

    #[test]
    fn prop_species_rate_never_negative(rate in -10.0f64..10.0) {
        let def = SpeciesDef::new("x", "").with_rate(rate);
        prop_assert!(def.effective_rate() >= 0.0);
    }
}
