//! Cat Pop - tap the cats before they fall
//!
//! Core modules:
//! - `sim`: Entity simulation (ballistics, spawning, lifecycle, session state machine)
//! - `services`: External collaborators (score backend, audio cues, player profiles)
//! - `platform`: Browser/native platform abstraction
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod highscores;
pub mod platform;
pub mod services;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::{HighScores, LocalScoreService};
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Downward acceleration in screen space (pixels/ms²)
    pub const GRAVITY: f32 = 0.001;
    /// Spawn line distance below the visible area (pixels)
    pub const SPAWN_OFFSET_Y: f32 = 100.0;
    /// Viewport height divisor for the launch boost: `1 + h / BOOST_DIVISOR`
    pub const BOOST_DIVISOR: f32 = 2500.0;
    /// Horizontal drift toward the viewport center (pixels/ms)
    pub const HORIZONTAL_DRIFT: f32 = 0.1;

    /// Base time between spawn bursts at difficulty tier 1 (ms)
    pub const BASE_SPAWN_INTERVAL_MS: f64 = 2500.0;
    /// Delay between consecutive spawns inside one burst (ms)
    pub const SPAWN_STAGGER_MS: f64 = 200.0;
    /// Largest burst the scheduler will produce
    pub const MAX_SPAWN_BATCH: u32 = 5;
    /// Score needed for each additional cat per burst
    pub const SCORE_PER_BATCH_STEP: u64 = 6;
    /// Highest difficulty tier
    pub const MAX_DIFFICULTY_TIER: u32 = 3;
    /// Score needed for each difficulty tier step
    pub const SCORE_PER_DIFFICULTY_STEP: u64 = 50;

    /// Lives at the start of every run
    pub const STARTING_LIVES: u32 = 3;
    /// Lifetime of the "+points" popup after a collect (ms)
    pub const FEEDBACK_DURATION_MS: f64 = 700.0;
    /// Largest frame delta fed to the integrator (ms)
    pub const MAX_FRAME_DT_MS: f32 = 100.0;
    /// Default tap radius around a cat's position (pixels)
    pub const HIT_RADIUS: f32 = 64.0;
}

/// Horizontal center of a viewport of the given width
#[inline]
pub fn center_x(width: f32) -> f32 {
    width / 2.0
}

/// Squared distance check used by hit testing
#[inline]
pub fn within_radius(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance_squared(b) <= radius * radius
}
