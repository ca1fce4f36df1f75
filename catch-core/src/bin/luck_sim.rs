//! Monte-Carlo rarity table for a given luck value.
//!
//! Usage: `luck_sim [luck] [trials] [weather]`
//!
//! `CATCH_CATALOG` points at a catalog file; the built-in catalog is used
//! otherwise. `CATCH_SEED` fixes the generator seed.

use anyhow::{bail, Context, Result};
use tracing::info;

use catch_core::logging::{init_tracing_default, TimingSpan};
use catch_core::rarity::{simulate, total_luck};
use catch_core::{Catalog, PipelineConfig, WorldState};

fn main() -> Result<()> {
    init_tracing_default();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let luck: f64 = match args.first() {
        Some(raw) => raw.parse().with_context(|| format!("invalid luck `{}`", raw))?,
        None => 0.0,
    };
    let trials: u64 = match args.get(1) {
        Some(raw) => raw.parse().with_context(|| format!("invalid trial count `{}`", raw))?,
        None => 1_000_000,
    };
    let seed: u64 = std::env::var("CATCH_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let catalog = match std::env::var("CATCH_CATALOG") {
        Ok(path) => Catalog::load(&path).with_context(|| format!("loading catalog {}", path))?,
        Err(_) => Catalog::builtin(),
    };

    let world = match args.get(2) {
        Some(id) => match catalog.weathers.get(id) {
            Some(def) => WorldState::from_weather(id, def, 0),
            None => bail!("unknown weather `{}`", id),
        },
        None => WorldState::clear(),
    };

    let config = PipelineConfig::default();
    let luck = config.base_luck + luck;
    info!(
        "Simulating {} catches at luck {:.2} (+{:.2} from {})",
        trials, luck, world.luck_bonus, world.name
    );

    let report = {
        let _span = TimingSpan::new("luck_sim");
        simulate(&catalog, luck, &world, trials, seed)?
    };

    println!("luck {:.2} | {} trials | seed {}", total_luck(luck, &world), trials, seed);
    println!("{:<10} {:>12} {:>10} {:>10}", "tier", "count", "observed", "expected");
    for (rarity, count) in &report.counts {
        let expected = report.expected.get(rarity).copied().unwrap_or(0.0);
        println!(
            "{:<10} {:>12} {:>9.4}% {:>9.4}%",
            rarity.display_name(),
            count,
            report.observed(*rarity) * 100.0,
            expected * 100.0
        );
    }
    println!("max deviation: {:.5}", report.max_deviation());
    Ok(())
}
