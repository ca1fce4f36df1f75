//! Server configuration - optional JSON file, then `CATCH_*` environment overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use catch_core::logging::TracingConfig;

use crate::store::writer::PersistConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
    Lmdb,
    Postgres,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "lmdb" => Ok(BackendKind::Lmdb),
            "postgres" | "postgresql" => Ok(BackendKind::Postgres),
            other => Err(ConfigError::InvalidValue {
                key: "CATCH_BACKEND".into(),
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for {key}: `{value}`")]
    InvalidValue { key: String, value: String },
    #[error("backend `postgres` needs a database URL (CATCH_DATABASE_URL)")]
    MissingDatabaseUrl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub backend: BackendKind,
    pub lmdb_path: PathBuf,
    /// LMDB map size in bytes
    pub lmdb_map_size: usize,
    pub database_url: Option<String>,
    pub pg_max_connections: u32,
    /// Catalog file (.json or .ron); the built-in catalog when absent
    pub catalog_path: Option<PathBuf>,
    /// Pipeline tunables as JSON; defaults when absent
    pub pipeline_path: Option<PathBuf>,
    pub challenge_cooldown_secs: f64,
    pub persist: PersistConfig,
    /// Fixed root seed for catch and weather randomness
    pub rng_seed: Option<u64>,
    pub weather_enabled: bool,
    pub tracing: TracingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Lmdb,
            lmdb_path: PathBuf::from("data/players"),
            lmdb_map_size: 256 * 1024 * 1024,
            database_url: None,
            pg_max_connections: 10,
            catalog_path: None,
            pipeline_path: None,
            challenge_cooldown_secs: 10.0,
            persist: PersistConfig::default(),
            rng_seed: None,
            weather_enabled: true,
            tracing: TracingConfig::default(),
        }
    }
}

fn parse<T: FromStr>(key: &str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key: key.to_string(), value: raw })
}

impl ServerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// File (if given) plus process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CATCH_*` overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("CATCH_BACKEND") {
            self.backend = raw.parse()?;
        }
        if let Some(raw) = lookup("CATCH_LMDB_PATH") {
            self.lmdb_path = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("CATCH_LMDB_MAP_SIZE") {
            self.lmdb_map_size = parse("CATCH_LMDB_MAP_SIZE", raw)?;
        }
        if let Some(raw) = lookup("CATCH_DATABASE_URL").or_else(|| lookup("DATABASE_URL")) {
            self.database_url = Some(raw);
        }
        if let Some(raw) = lookup("CATCH_PG_MAX_CONNECTIONS") {
            self.pg_max_connections = parse("CATCH_PG_MAX_CONNECTIONS", raw)?;
        }
        if let Some(raw) = lookup("CATCH_CATALOG") {
            self.catalog_path = Some(PathBuf::from(raw));
        }
        if let Some(raw) = lookup("CATCH_PIPELINE") {
            self.pipeline_path = Some(PathBuf::from(raw));
        }
        if let Some(raw) = lookup("CATCH_COOLDOWN_SECS") {
            self.challenge_cooldown_secs = parse("CATCH_COOLDOWN_SECS", raw)?;
        }
        if let Some(raw) = lookup("CATCH_PERSIST_RETRIES") {
            self.persist.max_retries = parse("CATCH_PERSIST_RETRIES", raw)?;
        }
        if let Some(raw) = lookup("CATCH_SEED") {
            self.rng_seed = Some(parse("CATCH_SEED", raw)?);
        }
        if let Some(raw) = lookup("CATCH_WEATHER") {
            self.weather_enabled = parse("CATCH_WEATHER", raw)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == BackendKind::Postgres && self.database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if !self.challenge_cooldown_secs.is_finite() || self.challenge_cooldown_secs < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "challenge_cooldown_secs".into(),
                value: self.challenge_cooldown_secs.to_string(),
            });
        }
        Ok(())
    }

    /// LMDB requires the map size to be a multiple of the OS page size
    pub fn lmdb_map_size_aligned(&self) -> usize {
        let page_size = 4096_usize;
        self.lmdb_map_size.div_ceil(page_size) * page_size
    }

    pub fn challenge_cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.challenge_cooldown_secs.max(0.0))
    }
}
