//! World-state provider and the background weather scheduler
//!
//! The scheduler is the only owner of weather transitions. It publishes each
//! new [`WorldState`] over a `watch` channel; resolutions take an immutable
//! snapshot with [`WorldStateProvider::current`].

use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use catch_core::world::pick_weather;
use catch_core::{Catalog, WorldState};

use crate::now_epoch;

pub trait WorldStateProvider: Send + Sync {
    fn current(&self) -> WorldState;
}

/// A world that never changes (tests, or weather disabled)
pub struct FixedWorld(pub WorldState);

impl WorldStateProvider for FixedWorld {
    fn current(&self) -> WorldState {
        self.0.clone()
    }
}

pub struct WeatherScheduler {
    rx: watch::Receiver<WorldState>,
}

impl WeatherScheduler {
    /// Start the transition loop; the first weather is picked immediately
    pub fn spawn(catalog: Arc<Catalog>, seed: u64) -> (Self, JoinHandle<()>) {
        let (tx, rx) = watch::channel(WorldState::clear());
        let handle = tokio::spawn(async move {
            Self::run(catalog, seed, tx).await;
        });
        (Self { rx }, handle)
    }

    pub fn subscribe(&self) -> watch::Receiver<WorldState> {
        self.rx.clone()
    }

    async fn run(catalog: Arc<Catalog>, seed: u64, tx: watch::Sender<WorldState>) {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        loop {
            let Some((id, def)) = pick_weather(&catalog, &mut rng) else {
                warn!("No selectable weather in catalog; world stays clear");
                return;
            };

            let world = WorldState::from_weather(id, def, now_epoch());
            info!(
                "Weather changed to {} for {}s (luck +{:.1}, magnitude x{:.2}, shiny x{:.2})",
                world.name,
                def.duration_secs,
                world.luck_bonus,
                world.magnitude_factor(),
                world.shiny_factor()
            );

            if tx.send(world).is_err() {
                info!("Weather scheduler stopped: no subscribers");
                return;
            }
            tokio::time::sleep(Duration::from_secs(def.duration_secs.max(1))).await;
        }
    }
}

impl WorldStateProvider for WeatherScheduler {
    fn current(&self) -> WorldState {
        self.rx.borrow().clone()
    }
}
