//! Centralized game constants for the catch core.
//!
//! Balance values that operators tune live in [`crate::config::PipelineConfig`];
//! these are the fixed rules of the game.

// =====================================================
// Catch objects
// =====================================================

/// Length of a catch object id
pub const CATCH_ID_LEN: usize = 4;

/// Alphabet catch ids are drawn from
pub const CATCH_ID_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Draws attempted before giving up on finding an unused catch id
pub const CATCH_ID_MAX_ATTEMPTS: usize = 500;

/// Chance that a successful catch also drops a random accessory (0.036%)
pub const ITEM_DROP_CHANCE: f64 = 0.000_36;

// =====================================================
// Level gates
// =====================================================

/// Level at which the first accessory slot unlocks
pub const ACCESSORY_SLOT_UNLOCK_LEVEL: u32 = 5;

/// Accessory slots granted by level once unlocked
pub const ACCESSORY_SLOTS_UNLOCKED: usize = 1;

/// Level at which a third active companion slot unlocks
pub const EXTRA_COMPANION_SLOT_LEVEL: u32 = 10;

pub const BASE_ACTIVE_COMPANIONS: usize = 2;
pub const MAX_ACTIVE_COMPANIONS: usize = 3;

/// Display tank capacity thresholds: (minimum level, capacity), ascending
pub const TANK_CAPACITY_BY_LEVEL: [(u32, usize); 4] = [(1, 2), (5, 3), (10, 4), (20, 5)];

// =====================================================
// Display tank & daily
// =====================================================

/// Minimum age of a tank entry before it yields income
pub const TANK_MIN_INCOME_SECS: i64 = 60;

/// Seconds between daily claims
pub const DAILY_COOLDOWN_SECS: i64 = 86_400;

// =====================================================
// Challenge
// =====================================================

/// Keys a challenge sequence is built from
pub const CHALLENGE_KEYS: [char; 4] = ['d', 'f', 'j', 'k'];
