//! Rate limiting utilities
//!
//! Cooldowns are measured in game time so that pausing freezes them along
//! with the rest of the simulation.

use std::collections::HashMap;
use std::hash::Hash;

/// Per-key fire cooldown keyed by shooter
#[derive(Debug, Clone)]
pub struct Cooldown<K> {
    period_ms: u64,
    last_accepted: HashMap<K, u64>,
}

impl<K: Eq + Hash> Cooldown<K> {
    pub fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            last_accepted: HashMap::new(),
        }
    }

    /// Check if `key` may act at `now_ms` (returns true if allowed)
    pub fn is_ready(&self, key: &K, now_ms: u64) -> bool {
        match self.last_accepted.get(key) {
            Some(&last) => now_ms.saturating_sub(last) >= self.period_ms,
            None => true,
        }
    }

    /// Record an accepted action
    pub fn record(&mut self, key: K, now_ms: u64) {
        self.last_accepted.insert(key, now_ms);
    }

    /// Check and record in one step (returns true if allowed)
    pub fn try_acquire(&mut self, key: K, now_ms: u64) -> bool {
        if self.is_ready(&key, now_ms) {
            self.record(key, now_ms);
            true
        } else {
            false
        }
    }

    /// Milliseconds until `key` may act again (0 = ready)
    pub fn remaining(&self, key: &K, now_ms: u64) -> u64 {
        self.last_accepted
            .get(key)
            .map(|&last| (last + self.period_ms).saturating_sub(now_ms))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_action_inside_period_is_refused() {
        let mut cooldown = Cooldown::new(500);
        assert!(cooldown.try_acquire("player", 1_000));
        assert!(!cooldown.try_acquire("player", 1_499));
        assert!(cooldown.try_acquire("player", 1_500));
    }

    #[test]
    fn keys_are_independent() {
        let mut cooldown = Cooldown::new(500);
        assert!(cooldown.try_acquire("a", 0));
        assert!(cooldown.try_acquire("b", 10));
        assert_eq!(cooldown.remaining(&"a", 100), 400);
        assert_eq!(cooldown.remaining(&"c", 100), 0);
    }
}
