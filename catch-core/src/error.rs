//! Configuration errors raised by catalog loading and the catch pipeline.
//!
//! These are content bugs, not player mistakes: they are surfaced to the
//! operator and never papered over with an arbitrary fallback choice.

use std::path::PathBuf;

use crate::rarity::Rarity;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog table `{0}` is empty")]
    MissingTable(&'static str),
    #[error("rarity tier `{0}` is referenced but not defined")]
    UnknownRarity(Rarity),
    #[error("rarity tier `{0}` has no species in its pool")]
    EmptySpeciesPool(Rarity),
    #[error("tool tiers must be contiguous from 1, missing tier {0}")]
    ToolTierGap(u32),
    #[error("companion `{0}` is not defined")]
    UnknownCompanion(String),
    #[error("incubation tier {0} is not defined")]
    UnknownIncubationTier(u32),
    #[error("total rarity weight is zero (luck = {luck})")]
    ZeroTotalWeight { luck: f64 },
    #[error("invalid weight table `{table}`: {reason}")]
    InvalidWeights { table: &'static str, reason: String },
    #[error("invalid value for `{field}`: {value}")]
    InvalidValue { field: String, value: f64 },
    #[error("unsupported catalog format: {0:?}")]
    UnsupportedFormat(PathBuf),
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse JSON catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse RON catalog: {0}")]
    Ron(#[from] ron::error::SpannedError),
}
