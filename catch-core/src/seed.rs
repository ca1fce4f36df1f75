//! Seed Data - built-in catalog content
//!
//! Used when no catalog file is configured, and as the baseline for tests and
//! benchmarks.

use std::collections::BTreeMap;

use crate::catalog::{
    AccessoryDef, Buffs, Catalog, CompanionDef, EventVariantDef, IncubationTierDef, RarityTierDef,
    SpeciesDef, ToolTierDef, WeatherBuffs, WeatherDef,
};
use crate::rarity::Rarity;

impl Catalog {
    /// The built-in catalog shipped with the server
    pub fn builtin() -> Self {
        Catalog {
            rarities: seed_rarities(),
            species: seed_species(),
            tools: seed_tools(),
            accessories: seed_accessories(),
            companions: seed_companions(),
            incubation_tiers: seed_incubation_tiers(),
            companion_rarity_weights: BTreeMap::from([
                (Rarity::Common, 70.0),
                (Rarity::Uncommon, 20.0),
                (Rarity::Rare, 9.0),
                (Rarity::Epic, 1.0),
                (Rarity::Legendary, 0.5),
                (Rarity::Mythical, 0.1),
            ]),
            weathers: seed_weathers(),
            secondary_rewards: BTreeMap::from([
                (Rarity::Epic, 5),
                (Rarity::Legendary, 10),
                (Rarity::Mythical, 15),
                (Rarity::Unreal, 50),
            ]),
        }
    }
}

fn tier(base_weight: f64, luck_factor: f64, unit_price: u64, range: (f64, f64)) -> RarityTierDef {
    RarityTierDef {
        base_weight,
        luck_factor,
        unit_price,
        magnitude_range: range,
    }
}

fn seed_rarities() -> BTreeMap<Rarity, RarityTierDef> {
    BTreeMap::from([
        (Rarity::Trash, tier(10_000.0, 0.0, 5, (0.1, 1.0))),
        (Rarity::Common, tier(50_000.0, 0.05, 10, (0.2, 1.5))),
        (Rarity::Uncommon, tier(25_000.0, 0.5, 30, (0.5, 3.0))),
        (Rarity::Rare, tier(10_000.0, 1.0, 120, (1.0, 6.0))),
        (Rarity::Epic, tier(5_000.0, 2.0, 500, (2.0, 10.0))),
        (Rarity::Legendary, tier(1_000.0, 5.0, 2_000, (5.0, 40.0))),
        (Rarity::Mythical, tier(100.0, 15.0, 10_000, (10.0, 100.0))),
        (Rarity::Unreal, tier(1.0, 50.0, 100_000, (50.0, 500.0))),
    ])
}

fn fish(name: &str, tag: &str, rate: f64, magnitude: f64, price: u64) -> SpeciesDef {
    SpeciesDef::new(name, tag)
        .with_rate(rate)
        .with_magnitude(magnitude)
        .with_price(price)
}

fn seed_species() -> BTreeMap<Rarity, Vec<SpeciesDef>> {
    BTreeMap::from([
        (
            Rarity::Trash,
            vec![
                fish("Torn Boot", "boot", 1.0, 0.5, 10),
                fish("Tin Can", "can", 1.0, 0.2, 30),
                fish("Fish Bone", "bone", 1.0, 0.1, 20),
            ],
        ),
        (
            Rarity::Common,
            vec![
                fish("Perch", "perch", 1.0, 3.0, 10),
                fish("Grass Carp", "carp", 1.0, 2.0, 14),
                fish("Silver Carp", "silver_carp", 1.0, 2.5, 15),
            ],
        ),
        (
            Rarity::Uncommon,
            vec![
                fish("Salmon", "salmon", 1.0, 4.0, 25),
                fish("Tuna", "tuna", 1.0, 3.0, 30),
            ],
        ),
        (
            Rarity::Rare,
            vec![
                fish("Swordfish", "swordfish", 1.0, 6.0, 120),
                fish("Giant Sea Bass", "sea_bass", 0.8, 12.0, 80),
            ],
        ),
        (
            Rarity::Epic,
            vec![
                fish("Penguin", "penguin", 1.0, 6.0, 2_000),
                fish("Squid", "squid", 1.0, 3.0, 3_500),
                fish("Dolphin", "dolphin", 0.7, 30.0, 500),
            ],
        ),
        (
            Rarity::Legendary,
            vec![fish("Blue Whale", "whale", 1.0, 500.0, 200)],
        ),
        (
            Rarity::Mythical,
            vec![fish("Divine Fish", "divine", 1.0, 100.0, 3_000)],
        ),
        (
            Rarity::Unreal,
            vec![fish("Great White King", "shark_king", 1.0, 1_500.0, 5_000)],
        ),
    ])
}

fn tool(name: &str, cost: u64, premium: Option<u64>, luck: f64, len: u32, penalty: f64) -> ToolTierDef {
    ToolTierDef {
        name: name.to_string(),
        cost,
        premium_cost: premium,
        luck,
        length_add: len,
        timeout_penalty: penalty,
    }
}

fn seed_tools() -> BTreeMap<u32, ToolTierDef> {
    BTreeMap::from([
        (1, tool("Bamboo Rod", 0, None, 0.0, 0, 0.0)),
        (2, tool("Wooden Rod", 1_000, None, 3.5, 4, 0.5)),
        (3, tool("Iron Rod", 10_000, None, 8.0, 6, 1.0)),
        (4, tool("Carbon Rod", 50_000, None, 13.0, 9, 2.0)),
        (5, tool("Legendary Rod", 200_000, Some(100), 20.0, 15, 5.0)),
        (6, tool("Mythic Rod", 1_000_000, Some(300), 35.0, 19, 9.0)),
        (7, tool("Infinity Rod", 5_000_000, Some(1_000), 50.0, 21, 10.0)),
    ])
}

fn accessory(name: &str, tag: &str, buffs: Buffs) -> AccessoryDef {
    AccessoryDef {
        name: name.to_string(),
        tag: tag.to_string(),
        buffs,
        sellable: true,
        sell_premium: 500,
        buy_premium: Some(2_000),
    }
}

fn seed_accessories() -> BTreeMap<String, AccessoryDef> {
    BTreeMap::from([
        (
            "01".to_string(),
            accessory(
                "Ancient Statue",
                "statue",
                Buffs {
                    xp_bonus: 30,
                    luck: 1.0,
                    magnitude_multiplier: Some(1.1),
                    ..Default::default()
                },
            ),
        ),
        (
            "02".to_string(),
            accessory(
                "Lucky Socks",
                "socks",
                Buffs {
                    xp_bonus: 20,
                    luck: 0.5,
                    timeout_bonus: 2.0,
                    ..Default::default()
                },
            ),
        ),
        (
            "03".to_string(),
            accessory(
                "Ancient Vase",
                "vase",
                Buffs {
                    luck: 0.8,
                    timeout_bonus: 1.5,
                    challenge_length_reduction: 2,
                    ..Default::default()
                },
            ),
        ),
        (
            "04".to_string(),
            accessory(
                "Mystic Coral",
                "coral",
                Buffs {
                    timeout_bonus: 5.0,
                    challenge_length_reduction: 1,
                    ..Default::default()
                },
            ),
        ),
        (
            "05".to_string(),
            accessory(
                "Sea Pearl",
                "pearl",
                Buffs {
                    luck: 1.5,
                    challenge_length_reduction: 3,
                    ..Default::default()
                },
            ),
        ),
    ])
}

fn companion(name: &str, tag: &str, rarity: Rarity, buffs: Buffs) -> CompanionDef {
    CompanionDef {
        name: name.to_string(),
        tag: tag.to_string(),
        rarity,
        buffs,
    }
}

fn seed_companions() -> BTreeMap<String, CompanionDef> {
    let entries = [
        ("c1", companion("Sparrow", "sparrow", Rarity::Common, Buffs { luck: 1.0, ..Default::default() })),
        ("c2", companion("Baby Turtle", "turtle", Rarity::Common, Buffs { timeout_bonus: 1.0, ..Default::default() })),
        (
            "c3",
            companion("Cat", "cat", Rarity::Common, Buffs { timeout_bonus: 0.5, xp_bonus: 5, ..Default::default() }),
        ),
        ("u1", companion("Goldfish", "goldfish", Rarity::Uncommon, Buffs { xp_bonus: 10, ..Default::default() })),
        ("u2", companion("Scorpion", "scorpion", Rarity::Uncommon, Buffs { luck: 2.0, ..Default::default() })),
        (
            "r1",
            companion("White Crane", "crane", Rarity::Rare, Buffs { challenge_length_reduction: 2, ..Default::default() }),
        ),
        (
            "r2",
            companion("Shark", "shark", Rarity::Rare, Buffs { timeout_bonus: 2.0, luck: 2.5, ..Default::default() }),
        ),
        (
            "e1",
            companion(
                "Water Dragon",
                "dragon",
                Rarity::Epic,
                Buffs { xp_bonus: 15, luck: 4.0, magnitude_multiplier: Some(1.1), ..Default::default() },
            ),
        ),
        (
            "e2",
            companion(
                "Peacock",
                "peacock",
                Rarity::Epic,
                Buffs { timeout_bonus: 2.0, challenge_length_reduction: 5, ..Default::default() },
            ),
        ),
        (
            "l1",
            companion(
                "Sea Spirit",
                "spirit",
                Rarity::Legendary,
                Buffs { extra_slot: 1, timeout_bonus: 2.0, magnitude_multiplier: Some(1.3), ..Default::default() },
            ),
        ),
        (
            "l2",
            companion("Unicorn", "unicorn", Rarity::Legendary, Buffs { xp_bonus: 40, luck: 6.0, ..Default::default() }),
        ),
        (
            "m1",
            companion(
                "Fire Phoenix",
                "phoenix",
                Rarity::Mythical,
                Buffs {
                    timeout_bonus: 5.0,
                    challenge_length_reduction: 5,
                    luck: 6.0,
                    magnitude_multiplier: Some(1.5),
                    ..Default::default()
                },
            ),
        ),
    ];
    entries.into_iter().map(|(id, def)| (id.to_string(), def)).collect()
}

fn incubation(price: u64, duration_secs: i64, pool: &[&str]) -> IncubationTierDef {
    IncubationTierDef {
        price,
        duration_secs,
        pool: pool.iter().map(|s| s.to_string()).collect(),
    }
}

fn seed_incubation_tiers() -> BTreeMap<u32, IncubationTierDef> {
    BTreeMap::from([
        (1, incubation(200, 60, &["c1", "c2", "c3", "u1"])),
        (2, incubation(1_000, 300, &["c1", "c2", "u2", "r1", "r2"])),
        (3, incubation(4_000, 900, &["u2", "r1", "r2", "e1", "e2", "l1"])),
        (4, incubation(50_000, 7_200, &["e1", "e2", "l2", "l1", "m1"])),
    ])
}

fn variant(name: &str, tag: &str, chance: f64, magnitude: f64, price: u64) -> EventVariantDef {
    EventVariantDef {
        species: SpeciesDef::new(name, tag)
            .with_magnitude(magnitude)
            .with_price(price),
        chance: Some(chance),
    }
}

fn weather(
    name: &str,
    duration_secs: u64,
    rate: f64,
    buffs: WeatherBuffs,
    variants: Vec<(Rarity, EventVariantDef)>,
) -> WeatherDef {
    let mut event_variants: BTreeMap<Rarity, Vec<EventVariantDef>> = BTreeMap::new();
    for (rarity, v) in variants {
        event_variants.entry(rarity).or_default().push(v);
    }
    WeatherDef {
        name: name.to_string(),
        duration_secs,
        rate,
        buffs,
        event_variants,
    }
}

fn seed_weathers() -> BTreeMap<String, WeatherDef> {
    let entries = [
        ("clear", weather("Clear Skies", 60, 0.5, WeatherBuffs::default(), Vec::new())),
        (
            "rain",
            weather(
                "Rain",
                180,
                0.25,
                WeatherBuffs { magnitude_multiplier: 1.10, ..Default::default() },
                vec![(Rarity::Rare, variant("Rainfish", "rainfish", 0.15, 8.0, 180))],
            ),
        ),
        (
            "storm",
            weather(
                "Storm",
                180,
                0.1,
                WeatherBuffs { magnitude_multiplier: 1.25, luck: 0.5, ..Default::default() },
                vec![(Rarity::Epic, variant("Thunderfish", "thunderfish", 0.08, 25.0, 950))],
            ),
        ),
        (
            "fog",
            weather(
                "Fog",
                240,
                0.15,
                WeatherBuffs { luck: 0.2, magnitude_multiplier: 1.05, ..Default::default() },
                vec![(Rarity::Epic, variant("Ghostfish", "ghostfish", 0.12, 6.66, 777))],
            ),
        ),
        (
            "meteor",
            weather(
                "Meteor Shower",
                120,
                0.01,
                WeatherBuffs {
                    shiny_multiplier: 3.0,
                    luck: 1.5,
                    magnitude_multiplier: 1.5,
                    ..Default::default()
                },
                Vec::new(),
            ),
        ),
        (
            "aurora",
            weather(
                "Aurora",
                120,
                0.02,
                WeatherBuffs {
                    secondary_multiplier: 2.0,
                    luck: 1.0,
                    magnitude_multiplier: 1.20,
                    ..Default::default()
                },
                vec![(Rarity::Epic, variant("Lightfish", "lightfish", 0.3, 3.5, 1_500))],
            ),
        ),
    ];
    entries.into_iter().map(|(id, def)| (id.to_string(), def)).collect()
}
