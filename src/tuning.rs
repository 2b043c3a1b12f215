//! Data-driven game balance
//!
//! Every field falls back to the compiled-in constant when missing from JSON,
//! so partial tuning files are valid.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Balance parameters for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Downward acceleration (pixels/ms²)
    pub gravity: f32,
    /// Spawn line below the viewport (pixels)
    pub spawn_offset_y: f32,
    /// Launch boost divisor (`1 + h / boost_divisor`)
    pub boost_divisor: f32,
    /// Horizontal drift toward center (pixels/ms)
    pub horizontal_drift: f32,
    /// Base spawn interval at tier 1 (ms)
    pub base_spawn_interval_ms: f64,
    /// Stagger between spawns of one burst (ms)
    pub spawn_stagger_ms: f64,
    /// Lives per run
    pub starting_lives: u32,
    /// Cosmetic popup lifetime (ms)
    pub feedback_duration_ms: f64,
    /// Frame delta clamp (ms)
    pub max_frame_dt_ms: f32,
    /// Cumulative rarity thresholds: [common, rare]; legendary takes the rest
    pub rarity_thresholds: [f32; 2],
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            spawn_offset_y: SPAWN_OFFSET_Y,
            boost_divisor: BOOST_DIVISOR,
            horizontal_drift: HORIZONTAL_DRIFT,
            base_spawn_interval_ms: BASE_SPAWN_INTERVAL_MS,
            spawn_stagger_ms: SPAWN_STAGGER_MS,
            starting_lives: STARTING_LIVES,
            feedback_duration_ms: FEEDBACK_DURATION_MS,
            max_frame_dt_ms: MAX_FRAME_DT_MS,
            rarity_thresholds: [0.70, 0.95],
        }
    }
}

impl Tuning {
    /// Parse a tuning file. Unknown fields are ignored, missing ones defaulted.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut tuning: Tuning = serde_json::from_str(json)?;
        tuning.sanitize();
        Ok(tuning)
    }

    /// Clamp values that would break the simulation
    fn sanitize(&mut self) {
        if !(self.gravity > 0.0) {
            log::warn!("Invalid gravity {}, using default", self.gravity);
            self.gravity = GRAVITY;
        }
        if !(self.boost_divisor > 0.0) {
            self.boost_divisor = BOOST_DIVISOR;
        }
        if !(self.base_spawn_interval_ms > 0.0) {
            self.base_spawn_interval_ms = BASE_SPAWN_INTERVAL_MS;
        }
        self.spawn_stagger_ms = self.spawn_stagger_ms.max(0.0);
        self.feedback_duration_ms = self.feedback_duration_ms.max(0.0);
        self.starting_lives = self.starting_lives.max(1);
        let [common, rare] = self.rarity_thresholds;
        let common = common.clamp(0.0, 1.0);
        self.rarity_thresholds = [common, rare.clamp(common, 1.0)];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "starting_lives": 5 }"#).unwrap();
        assert_eq!(tuning.starting_lives, 5);
        assert_eq!(tuning.gravity, GRAVITY);
        assert_eq!(tuning.base_spawn_interval_ms, BASE_SPAWN_INTERVAL_MS);
    }

    #[test]
    fn test_invalid_values_are_sanitized() {
        let json = r#"{ "gravity": -1.0, "starting_lives": 0, "rarity_thresholds": [0.9, 0.5] }"#;
        let tuning = Tuning::from_json(json).unwrap();
        assert_eq!(tuning.gravity, GRAVITY);
        assert_eq!(tuning.starting_lives, 1);
        assert_eq!(tuning.rarity_thresholds, [0.9, 0.9]);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(Tuning::from_json("{ not json").is_err());
    }
}
