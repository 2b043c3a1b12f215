//! Session state and core simulation types
//!
//! `GameSession` is the single authoritative registry of live cats. The
//! presentation layer only ever sees [`SessionSnapshot`].

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{AssetRef, Entity, EntityId, RarityTier};
use super::spawn::{difficulty_tier, spawn_batch_size};

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Title screen, nothing simulated
    Landing,
    /// Active gameplay
    Playing,
    /// Run ended, waiting for an explicit restart
    GameOver,
    /// Read-only leaderboard view
    Leaderboard,
}

/// Viewport size in CSS pixels, measured by the host
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A zero, negative or NaN dimension means the host has not laid out yet
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

/// Events emitted for the host (HUD, audio, parent controller).
/// Each fires at most once per qualifying occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Status transition
    StatusChanged { from: GameStatus, to: GameStatus },
    /// A new cat entered the registry
    Spawned { id: EntityId, tier: RarityTier },
    /// Player collected a cat
    Collected { id: EntityId, points: u32 },
    /// Score went up by `delta`
    ScoreChanged { delta: u32, score: u64 },
    /// A cat fell out after being on screen
    Missed { id: EntityId },
    /// A life was lost
    LifeLost { lives: u32 },
    /// A cat that never came on screen was dropped without penalty
    Discarded { id: EntityId },
    /// Lives reached zero
    GameOver { score: u64 },
}

/// Live cats keyed by id (ordered for deterministic iteration)
pub type EntityRegistry = BTreeMap<EntityId, Entity>;

/// One run's score, lives and registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    pub score: u64,
    pub lives: u32,
    pub status: GameStatus,
    pub entities: EntityRegistry,
}

impl GameSession {
    /// Fresh session on the landing screen
    pub fn new(lives: u32) -> Self {
        Self {
            score: 0,
            lives,
            status: GameStatus::Landing,
            entities: BTreeMap::new(),
        }
    }

    /// Reset for a new run (score 0, full lives, no cats)
    pub fn reset(&mut self, lives: u32) {
        self.score = 0;
        self.lives = lives;
        self.entities.clear();
    }

    pub fn is_playing(&self) -> bool {
        self.status == GameStatus::Playing && self.lives > 0
    }

    pub fn difficulty_tier(&self) -> u32 {
        difficulty_tier(self.score)
    }

    pub fn spawn_batch_size(&self) -> u32 {
        spawn_batch_size(self.score)
    }
}

/// Read-only view of a cat for drawing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub pos: Vec2,
    pub asset: AssetRef,
    pub points: u32,
}

impl From<&Entity> for EntityView {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id,
            pos: entity.pos,
            asset: entity.asset,
            points: entity.point_value(),
        }
    }
}

/// "+points" popup shown where a cat was collected
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedbackPopup {
    pub id: EntityId,
    pub pos: Vec2,
    pub points: u32,
    pub expires_at_ms: f64,
}

/// Everything a presentation layer needs for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: GameStatus,
    pub score: u64,
    pub lives: u32,
    pub difficulty_tier: u32,
    pub entities: Vec<EntityView>,
    pub popups: Vec<FeedbackPopup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_validity() {
        assert!(Viewport::new(800.0, 600.0).is_valid());
        assert!(!Viewport::new(0.0, 600.0).is_valid());
        assert!(!Viewport::new(800.0, -1.0).is_valid());
        assert!(!Viewport::new(f32::NAN, 600.0).is_valid());
        assert!(!Viewport::default().is_valid());
    }

    #[test]
    fn test_reset_clears_run() {
        let mut session = GameSession::new(3);
        session.score = 42;
        session.lives = 1;
        session.reset(3);
        assert_eq!(session.score, 0);
        assert_eq!(session.lives, 3);
        assert!(session.entities.is_empty());
    }

    #[test]
    fn test_derived_parameters_follow_score() {
        let mut session = GameSession::new(3);
        assert_eq!(session.spawn_batch_size(), 1);
        assert_eq!(session.difficulty_tier(), 1);
        session.score = 60;
        assert_eq!(session.spawn_batch_size(), 5);
        assert_eq!(session.difficulty_tier(), 2);
    }
}
