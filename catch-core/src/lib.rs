//! Catch Core - deterministic catch resolution
//!
//! This crate holds the pure game rules of the catch system:
//! - Catalog schema, validation and the built-in seed content
//! - Modifier aggregation (tool, accessories, companions)
//! - Rarity sampling with luck-responsive weights
//! - Species and event-variant resolution, shiny roll
//! - Magnitude and valuation
//! - Player document model and progression rules
//! - Timed input challenge generation
//! - World-state snapshots and weather selection
//!
//! Nothing here performs I/O apart from loading a catalog file; every random
//! decision takes an injected generator.

pub mod catalog;
pub mod challenge;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod magnitude;
pub mod modifiers;
pub mod pipeline;
pub mod player;
pub mod progression;
pub mod rarity;
pub mod seed;
pub mod species;
pub mod valuation;
pub mod world;

pub use catalog::Catalog;
pub use config::PipelineConfig;
pub use error::CatalogError;
pub use modifiers::{aggregate, Loadout, Modifiers};
pub use pipeline::{roll_catch, CatchRoll};
pub use player::{CatchObject, PlayerDocument};
pub use rarity::Rarity;
pub use world::WorldState;
