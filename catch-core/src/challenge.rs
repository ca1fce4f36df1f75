//! Timed input challenge.
//!
//! A challenge is a random key sequence over `d f j k`. Its length range and
//! timeout come from the base [`ChallengeConfig`](crate::config::ChallengeConfig)
//! adjusted by the equipped tool and the aggregated modifiers.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::PipelineConfig;
use crate::constants::CHALLENGE_KEYS;
use crate::modifiers::Modifiers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeKey {
    D,
    F,
    J,
    K,
}

impl ChallengeKey {
    pub const ALL: [ChallengeKey; 4] = [ChallengeKey::D, ChallengeKey::F, ChallengeKey::J, ChallengeKey::K];

    pub fn as_char(&self) -> char {
        match self {
            ChallengeKey::D => CHALLENGE_KEYS[0],
            ChallengeKey::F => CHALLENGE_KEYS[1],
            ChallengeKey::J => CHALLENGE_KEYS[2],
            ChallengeKey::K => CHALLENGE_KEYS[3],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChallengeParams {
    pub len_min: usize,
    pub len_max: usize,
    pub timeout_secs: f64,
}

impl ChallengeParams {
    /// Tool keys minus the modifier reduction (never below zero) are added to
    /// both length bounds; the timeout loses the tool penalty, gains the
    /// modifier bonus and is floored at `min_timeout_secs`.
    pub fn derive(config: &PipelineConfig, mods: &Modifiers) -> Self {
        let base = &config.challenge;
        let extra = mods.tool_length_add.saturating_sub(mods.challenge_length_reduction) as usize;
        let timeout = base.timeout_secs - mods.tool_timeout_penalty + mods.timeout_bonus;
        Self {
            len_min: base.len_min + extra,
            len_max: base.len_max.max(base.len_min) + extra,
            timeout_secs: timeout.max(base.min_timeout_secs),
        }
    }

    pub fn timeout(&self) -> Duration {
        timeout_duration(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub keys: Vec<ChallengeKey>,
    pub timeout_secs: f64,
}

impl Challenge {
    pub fn generate<R: Rng + ?Sized>(params: &ChallengeParams, rng: &mut R) -> Self {
        let len = rng.gen_range(params.len_min..=params.len_max.max(params.len_min));
        let keys = (0..len)
            .map(|_| ChallengeKey::ALL[rng.gen_range(0..ChallengeKey::ALL.len())])
            .collect();
        Self {
            keys,
            timeout_secs: params.timeout_secs,
        }
    }

    /// The exact letter sequence a player must type
    pub fn expected(&self) -> String {
        self.keys.iter().map(ChallengeKey::as_char).collect()
    }

    pub fn check(&self, input: &str) -> bool {
        normalize_input(input) == self.expected()
    }

    pub fn timeout(&self) -> Duration {
        timeout_duration(self.timeout_secs)
    }
}

/// Negative and NaN clamp to zero; values too large for a `Duration` saturate
fn timeout_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}

/// Lowercase and keep only challenge keys
pub fn normalize_input(input: &str) -> String {
    input
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| CHALLENGE_KEYS.contains(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_xoshiro::rand_core::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_base_params() {
        let params = ChallengeParams::derive(&PipelineConfig::default(), &Modifiers::default());
        assert_eq!(params.len_min, 4);
        assert_eq!(params.len_max, 5);
        assert_eq!(params.timeout_secs, 10.0);
    }

    #[test]
    fn test_tool_and_modifier_adjustments() {
        let mods = Modifiers {
            tool_length_add: 6,
            tool_timeout_penalty: 1.0,
            challenge_length_reduction: 2,
            timeout_bonus: 1.5,
            ..Default::default()
        };
        let params = ChallengeParams::derive(&PipelineConfig::default(), &mods);
        assert_eq!(params.len_min, 8);
        assert_eq!(params.len_max, 9);
        assert_eq!(params.timeout_secs, 10.5);
    }

    #[test]
    fn test_reduction_never_goes_below_base() {
        let mods = Modifiers {
            tool_length_add: 2,
            challenge_length_reduction: 10,
            tool_timeout_penalty: 50.0,
            ..Default::default()
        };
        let params = ChallengeParams::derive(&PipelineConfig::default(), &mods);
        assert_eq!(params.len_min, 4);
        assert_eq!(params.timeout_secs, 1.5, "timeout floors at the minimum");
    }

    #[test]
    fn test_generated_length_in_range() {
        let params = ChallengeParams {
            len_min: 4,
            len_max: 7,
            timeout_secs: 5.0,
        };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(17);
        for _ in 0..200 {
            let c = Challenge::generate(&params, &mut rng);
            assert!((4..=7).contains(&c.keys.len()));
            assert!(c.expected().chars().all(|ch| "dfjk".contains(ch)));
        }
    }

    #[test]
    fn test_timeout_never_panics_on_extreme_values() {
        let mods = Modifiers {
            timeout_bonus: f64::INFINITY,
            ..Default::default()
        };
        let params = ChallengeParams::derive(&PipelineConfig::default(), &mods);
        assert_eq!(params.timeout(), Duration::MAX, "infinite timeout saturates");

        let huge = Challenge {
            keys: vec![ChallengeKey::D],
            timeout_secs: 1e300,
        };
        assert_eq!(huge.timeout(), Duration::MAX);

        let nan = Challenge {
            keys: vec![ChallengeKey::D],
            timeout_secs: f64::NAN,
        };
        assert_eq!(nan.timeout(), Duration::ZERO);
    }

    #[test]
    fn test_normalize_input() {
        assert_eq!(normalize_input("D f-J k!"), "dfjk");
        assert_eq!(normalize_input("hello"), "");
    }

    #[test]
    fn test_check_accepts_noisy_correct_input() {
        let challenge = Challenge {
            keys: vec![ChallengeKey::D, ChallengeKey::K, ChallengeKey::K],
            timeout_secs: 3.0,
        };
        assert!(challenge.check("D K K"));
        assert!(!challenge.check("dk"));
        assert!(!challenge.check("dkkd"));
    }
}
