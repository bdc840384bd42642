//! Time utilities for game simulation
//!
//! All simulation time is game time in milliseconds. It only advances while
//! the session is unpaused.

use std::time::Duration;

/// Bullet physics cadence
pub const PHYSICS_TICK_MS: u64 = 50;
/// Robbery progress cadence
pub const ROBBERY_TICK_MS: u64 = 200;
/// Elapsed game time counter cadence
pub const GAME_CLOCK_TICK_MS: u64 = 1000;
/// Hostile AI decision cadence
pub const AI_TICK_MS: u64 = 2000;

/// Delay between reaching the robbery-mission store and completion
pub const ROBBERY_MISSION_DELAY_MS: u64 = 3000;

/// Minimum gap between two accepted shots from the same shooter
pub const FIRE_COOLDOWN_MS: u64 = 500;

/// Wall-clock period of the session loop
pub fn physics_tick_duration() -> Duration {
    Duration::from_millis(PHYSICS_TICK_MS)
}

/// Convert a wall-clock duration into whole game milliseconds
pub fn game_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robbery_takes_ten_progress_ticks() {
        assert_eq!(ROBBERY_TICK_MS * 10, 2000);
    }

    #[test]
    fn game_millis_truncates_sub_millisecond_time() {
        assert_eq!(game_millis(Duration::from_micros(50_900)), 50);
    }
}
