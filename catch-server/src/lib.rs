//! Catch Server Library
//!
//! Runtime around the pure rules in `catch_core`:
//! - Player State Store: in-memory, per-player locked, write-through
//! - Durable backends: LMDB (embedded), PostgreSQL, in-memory
//! - Economic operations (tools, accessories, companions, incubation, tank, sales)
//! - Catch service and challenge gate (cooldown, FIFO per player, timeout)
//! - Weather scheduler publishing world-state snapshots

pub mod catch;
pub mod challenge;
pub mod config;
pub mod runtime;
pub mod store;
pub mod weather;

pub use catch::{CatchError, CatchReceipt, CatchService};
pub use challenge::{ChallengeError, ChallengeGate, ChallengeOutcome};
pub use config::ServerConfig;
pub use runtime::CatchRuntime;
pub use store::{EconomyError, PlayerId, PlayerStore, SamePlayer, StoreError};

/// Current wall-clock time in epoch seconds
pub fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}
