//! Challenge gate - cooldown, per-player FIFO and the timed input window
//!
//! ## Architecture
//! ```text
//! attempt(player)
//!       ↓ cooldown since last attempt? ── yes ──> Err(Cooldown { remaining })
//!       ↓ stamp attempt time
//! [per-player tokio Mutex]   (fair: queued attempts run in arrival order)
//!       ↓ inventory full? ── yes ──> Err(Catch(InventoryFull))
//! generate challenge → respond(challenge) within timeout
//!       ├─ no answer / too late ──> TimedOut     (no mutation)
//!       ├─ wrong keys ───────────> WrongInput   (no mutation)
//!       └─ correct ──> snapshot world ──> CatchService::resolve_catch ──> Caught
//! ```

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use catch_core::challenge::Challenge;

use crate::catch::{CatchError, CatchReceipt, CatchService};
use crate::store::PlayerId;
use crate::weather::WorldStateProvider;

#[derive(Debug, Clone, Serialize)]
pub enum ChallengeOutcome {
    Caught(Box<CatchReceipt>),
    WrongInput { expected: String, got: String },
    TimedOut,
}

impl ChallengeOutcome {
    pub fn is_caught(&self) -> bool {
        matches!(self, ChallengeOutcome::Caught(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChallengeError {
    #[error("on cooldown for another {remaining:?}")]
    Cooldown { remaining: Duration },
    #[error(transparent)]
    Catch(#[from] CatchError),
}

pub struct ChallengeGate {
    cooldown: Duration,
    last_attempt: Mutex<HashMap<PlayerId, Instant>>,
    turns: Mutex<HashMap<PlayerId, Arc<tokio::sync::Mutex<()>>>>,
}

impl ChallengeGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_attempt: Mutex::new(HashMap::new()),
            turns: Mutex::new(HashMap::new()),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Reject if the previous attempt was too recent, otherwise stamp this one
    pub fn check_cooldown(&self, player: &PlayerId) -> Result<(), ChallengeError> {
        let now = Instant::now();
        let mut last = self.last_attempt.lock();
        if let Some(previous) = last.get(player) {
            let elapsed = now.duration_since(*previous);
            if elapsed < self.cooldown {
                return Err(ChallengeError::Cooldown {
                    remaining: self.cooldown - elapsed,
                });
            }
        }
        last.insert(player.clone(), now);
        Ok(())
    }

    fn turn(&self, player: &PlayerId) -> Arc<tokio::sync::Mutex<()>> {
        self.turns.lock().entry(player.clone()).or_default().clone()
    }

    /// Run one full challenge attempt.
    ///
    /// `respond` receives the generated challenge and resolves to the
    /// player's raw input, or `None` if they gave up.
    pub async fn attempt<F, Fut>(
        &self,
        service: &CatchService,
        world: &dyn WorldStateProvider,
        player: &PlayerId,
        respond: F,
    ) -> Result<ChallengeOutcome, ChallengeError>
    where
        F: FnOnce(Challenge) -> Fut,
        Fut: Future<Output = Option<String>>,
    {
        self.check_cooldown(player)?;

        let turn = self.turn(player);
        let _guard = turn.lock().await;

        if let Some(cap) = service.inventory_full(player) {
            debug!("Challenge refused for {}: inventory full ({})", player, cap);
            return Err(CatchError::InventoryFull { cap }.into());
        }

        let challenge = service.generate_challenge(player);
        let window = challenge.timeout();
        let expected = challenge.expected();

        let input = match tokio::time::timeout(window, respond(challenge.clone())).await {
            Ok(Some(input)) => input,
            Ok(None) | Err(_) => {
                debug!("Challenge for {} timed out after {:?}", player, window);
                return Ok(ChallengeOutcome::TimedOut);
            }
        };

        if !challenge.check(&input) {
            debug!("Challenge for {} failed: expected {}, got {}", player, expected, input);
            return Ok(ChallengeOutcome::WrongInput { expected, got: input });
        }

        let snapshot = world.current();
        let receipt = service.resolve_catch(player, &snapshot)?;
        Ok(ChallengeOutcome::Caught(Box::new(receipt)))
    }
}
