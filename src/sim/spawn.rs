//! Score-driven spawn scheduling
//!
//! The scheduler only decides *when* a burst is due and how it is staggered.
//! The session turns each planned spawn into a one-shot timer.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::tuning::Tuning;

/// Cats per burst: one more every 6 points, capped at 5
pub fn spawn_batch_size(score: u64) -> u32 {
    let steps = score / SCORE_PER_BATCH_STEP;
    (1 + steps).min(MAX_SPAWN_BATCH as u64) as u32
}

/// Difficulty tier: one step every 50 points, capped at 3
pub fn difficulty_tier(score: u64) -> u32 {
    let steps = score / SCORE_PER_DIFFICULTY_STEP;
    (1 + steps).min(MAX_DIFFICULTY_TIER as u64) as u32
}

/// Time between bursts for a given difficulty tier (ms)
pub fn spawn_interval_ms(tier: u32, tuning: &Tuning) -> f64 {
    tuning.base_spawn_interval_ms / tier.max(1) as f64
}

/// Periodic burst planner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnScheduler {
    last_spawn_ms: f64,
}

impl SpawnScheduler {
    /// Start the interval clock at `now_ms`
    pub fn new(now_ms: f64) -> Self {
        Self {
            last_spawn_ms: now_ms,
        }
    }

    /// Restart the interval clock (new run)
    pub fn reset(&mut self, now_ms: f64) {
        self.last_spawn_ms = now_ms;
    }

    /// Check whether a burst is due.
    ///
    /// Returns the delay (ms after `now_ms`) of each spawn in the burst, or an
    /// empty list if the interval has not elapsed yet.
    pub fn check(&mut self, now_ms: f64, score: u64, tuning: &Tuning) -> Vec<f64> {
        let interval = spawn_interval_ms(difficulty_tier(score), tuning);
        if now_ms - self.last_spawn_ms <= interval {
            return Vec::new();
        }

        self.last_spawn_ms = now_ms;
        (0..spawn_batch_size(score))
            .map(|i| i as f64 * tuning.spawn_stagger_ms)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_batch_size_table() {
        assert_eq!(spawn_batch_size(0), 1);
        assert_eq!(spawn_batch_size(5), 1);
        assert_eq!(spawn_batch_size(6), 2);
        assert_eq!(spawn_batch_size(18), 4);
        assert_eq!(spawn_batch_size(24), 5);
        assert_eq!(spawn_batch_size(1_000_000), 5);
    }

    #[test]
    fn test_difficulty_table() {
        assert_eq!(difficulty_tier(0), 1);
        assert_eq!(difficulty_tier(49), 1);
        assert_eq!(difficulty_tier(50), 2);
        assert_eq!(difficulty_tier(100), 3);
        assert_eq!(difficulty_tier(u64::MAX), 3);
    }

    #[test]
    fn test_interval_shrinks_with_tier() {
        let tuning = Tuning::default();
        assert_eq!(spawn_interval_ms(1, &tuning), 2500.0);
        assert_eq!(spawn_interval_ms(2, &tuning), 1250.0);
        assert!((spawn_interval_ms(3, &tuning) - 833.333).abs() < 0.01);
    }

    #[test]
    fn test_check_waits_for_strictly_greater_interval() {
        let tuning = Tuning::default();
        let mut scheduler = SpawnScheduler::new(0.0);
        assert!(scheduler.check(1000.0, 0, &tuning).is_empty());
        assert!(scheduler.check(2500.0, 0, &tuning).is_empty());
        assert_eq!(scheduler.check(2501.0, 0, &tuning), vec![0.0]);
        // Clock restarted at 2501
        assert!(scheduler.check(3000.0, 0, &tuning).is_empty());
        assert!(scheduler.check(5001.0, 0, &tuning).is_empty());
        assert_eq!(scheduler.check(5002.0, 0, &tuning), vec![0.0]);
    }

    #[test]
    fn test_burst_is_staggered() {
        let tuning = Tuning::default();
        let mut scheduler = SpawnScheduler::new(0.0);
        let delays = scheduler.check(3000.0, 18, &tuning);
        assert_eq!(delays, vec![0.0, 200.0, 400.0, 600.0]);
    }

    #[test]
    fn test_higher_tier_spawns_sooner() {
        let tuning = Tuning::default();
        let mut scheduler = SpawnScheduler::new(0.0);
        // Tier 3 at score 100: interval ~833ms, batch 5
        let delays = scheduler.check(900.0, 100, &tuning);
        assert_eq!(delays.len(), 5);
    }

    proptest! {
        #[test]
        fn prop_derived_parameters_in_range(score in 0u64..100_000) {
            let batch = spawn_batch_size(score);
            let tier = difficulty_tier(score);
            prop_assert!((1..=5).contains(&batch));
            prop_assert!((1..=3).contains(&tier));
            prop_assert!(spawn_batch_size(score + 1) >= batch);
            prop_assert!(difficulty_tier(score + 1) >= tier);
        }
    }
}
