//! Entity simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Host-supplied time only (no clocks read here)
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod entity;
pub mod input;
pub mod lifecycle;
pub mod physics;
pub mod session;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod timers;

pub use entity::{AssetRef, Entity, EntityFactory, EntityId, RarityTier};
pub use input::{CollectEvent, InputDispatcher};
pub use lifecycle::{LifecyclePhase, LifecycleReport, LifecycleTracker, classify};
pub use physics::{apex_time, integrate, launch_velocity};
pub use session::{LEADERBOARD_LIMIT, LeaderboardView, RunResult, SessionStateMachine};
pub use spawn::{SpawnScheduler, difficulty_tier, spawn_batch_size};
pub use state::{
    EntityRegistry, EntityView, FeedbackPopup, GameEvent, GameSession, GameStatus,
    SessionSnapshot, Viewport,
};
pub use tick::{clamp_dt, tick};
pub use timers::{TimerAction, TimerQueue};
