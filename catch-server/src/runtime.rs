//! Startup wiring: catalog, pipeline tunables, backend, hydrated store,
//! catch service, challenge gate and world-state provider.

use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use catch_core::challenge::Challenge;
use catch_core::{Catalog, CatalogError, PipelineConfig, WorldState};

use crate::catch::CatchService;
use crate::challenge::{ChallengeError, ChallengeGate, ChallengeOutcome};
use crate::config::{BackendKind, ConfigError, ServerConfig};
use crate::store::backend::{BackendError, DurableBackend};
use crate::store::lmdb::LmdbBackend;
use crate::store::memory::MemoryBackend;
use crate::store::postgres::PostgresBackend;
use crate::store::{PlayerId, PlayerStore, StoreError};
use crate::weather::{FixedWorld, WeatherScheduler, WorldStateProvider};

/// Keeps the weather stream independent of the catch stream under one seed
const WEATHER_SEED_SALT: u64 = 0x5745_4154_4845_5221;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("backend: {0}")]
    Backend(#[from] BackendError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
}

pub fn load_catalog(config: &ServerConfig) -> Result<Catalog, CatalogError> {
    match &config.catalog_path {
        Some(path) => Catalog::load(path),
        None => {
            let catalog = Catalog::builtin();
            catalog.validate()?;
            info!("Using built-in catalog ({} species)", catalog.species_count());
            Ok(catalog)
        }
    }
}

pub fn load_pipeline(config: &ServerConfig) -> Result<PipelineConfig, CatalogError> {
    let pipeline = match &config.pipeline_path {
        Some(path) => PipelineConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => PipelineConfig::default(),
    };
    pipeline.validate()?;
    Ok(pipeline)
}

pub async fn open_backend(config: &ServerConfig) -> Result<Arc<dyn DurableBackend>, StartupError> {
    let backend: Arc<dyn DurableBackend> = match config.backend {
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
        BackendKind::Lmdb => Arc::new(LmdbBackend::new(&config.lmdb_path, config.lmdb_map_size_aligned())?),
        BackendKind::Postgres => {
            let url = config.database_url.as_deref().ok_or(ConfigError::MissingDatabaseUrl)?;
            Arc::new(PostgresBackend::new(url, config.pg_max_connections).await?)
        }
    };
    Ok(backend)
}

pub struct CatchRuntime {
    pub store: Arc<PlayerStore>,
    pub service: Arc<CatchService>,
    pub gate: Arc<ChallengeGate>,
    pub world: Arc<dyn WorldStateProvider>,
    weather_task: Option<JoinHandle<()>>,
}

impl CatchRuntime {
    pub async fn start(config: &ServerConfig) -> Result<Self, StartupError> {
        let backend = open_backend(config).await?;
        Self::start_with_backend(config, backend).await
    }

    /// Hydrate from `backend` and wire every component
    pub async fn start_with_backend(
        config: &ServerConfig,
        backend: Arc<dyn DurableBackend>,
    ) -> Result<Self, StartupError> {
        let catalog = Arc::new(load_catalog(config)?);
        let pipeline = Arc::new(load_pipeline(config)?);

        let store = Arc::new(
            PlayerStore::hydrate(backend, catalog.clone(), pipeline, config.persist.clone()).await?,
        );
        let service = Arc::new(CatchService::new(store.clone(), config.rng_seed));
        let gate = Arc::new(ChallengeGate::new(config.challenge_cooldown()));

        let (world, weather_task) = if config.weather_enabled {
            let seed = config
                .rng_seed
                .map(|s| s ^ WEATHER_SEED_SALT)
                .unwrap_or_else(rand::random);
            let (scheduler, task) = WeatherScheduler::spawn(catalog, seed);
            (Arc::new(scheduler) as Arc<dyn WorldStateProvider>, Some(task))
        } else {
            (Arc::new(FixedWorld(WorldState::clear())) as Arc<dyn WorldStateProvider>, None)
        };

        info!(
            "Catch runtime ready: {} players, cooldown {:?}, weather {}",
            store.len(),
            gate.cooldown(),
            if weather_task.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            store,
            service,
            gate,
            world,
            weather_task,
        })
    }

    /// Cooldown, queue, challenge and resolution for one player
    pub async fn attempt_catch<F, Fut>(&self, player: &PlayerId, respond: F) -> Result<ChallengeOutcome, ChallengeError>
    where
        F: FnOnce(Challenge) -> Fut,
        Fut: Future<Output = Option<String>>,
    {
        self.gate
            .attempt(&self.service, self.world.as_ref(), player, respond)
            .await
    }

    /// Stop the weather loop and drain queued writes
    pub async fn shutdown(self) {
        if let Some(task) = self.weather_task {
            task.abort();
        }
        self.store.flush().await;
        let stats = self.store.writer_stats();
        info!(
            "Catch runtime stopped: {} writes ({} retries, {} dropped)",
            stats.written, stats.retries, stats.dropped
        );
    }
}
