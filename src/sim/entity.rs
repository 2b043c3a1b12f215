//! Cat entities and the factory that rolls them
//!
//! A cat is created once, below the visible area, with a rarity tier drawn from
//! a fixed distribution. Position and velocity are the only fields that change
//! afterwards.

use glam::Vec2;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::physics;
use super::state::Viewport;
use crate::tuning::Tuning;

/// Opaque cat identifier, unique for the lifetime of a [`super::SessionStateMachine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cat#{}", self.0)
    }
}

/// Rarity tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RarityTier {
    Common,
    Rare,
    Legendary,
}

impl RarityTier {
    /// Score awarded for collecting a cat of this tier
    pub fn point_value(self) -> u32 {
        match self {
            RarityTier::Common => 1,
            RarityTier::Rare => 3,
            RarityTier::Legendary => 5,
        }
    }

    /// Number of sticker variants drawn for this tier
    pub fn asset_count(self) -> u8 {
        match self {
            RarityTier::Common => 5,
            RarityTier::Rare => 2,
            RarityTier::Legendary => 1,
        }
    }

    /// Map a uniform draw in [0, 1) onto a tier using cumulative thresholds
    pub fn from_roll(roll: f32, thresholds: [f32; 2]) -> Self {
        if roll < thresholds[0] {
            RarityTier::Common
        } else if roll < thresholds[1] {
            RarityTier::Rare
        } else {
            RarityTier::Legendary
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RarityTier::Common => "common",
            RarityTier::Rare => "rare",
            RarityTier::Legendary => "legendary",
        }
    }
}

/// Visual reference: which sticker of the tier's set to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub tier: RarityTier,
    pub variant: u8,
}

/// A spawned cat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub tier: RarityTier,
    pub pos: Vec2,
    /// Pixels per millisecond, +y is down
    pub vel: Vec2,
    /// Set once the cat has been inside the viewport; never cleared
    pub has_entered: bool,
    pub asset: AssetRef,
}

impl Entity {
    pub fn point_value(&self) -> u32 {
        self.tier.point_value()
    }

    /// Mark as entered. Returns true only on the first call.
    pub fn mark_entered(&mut self) -> bool {
        let first = !self.has_entered;
        self.has_entered = true;
        first
    }
}

/// Rolls new cats from a seeded RNG
#[derive(Debug, Clone)]
pub struct EntityFactory {
    rng: Pcg32,
}

impl EntityFactory {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Create a cat just below the viewport with its launch velocity.
    ///
    /// Returns `None` for a degenerate viewport; callers defer the spawn.
    pub fn create(&mut self, id: EntityId, viewport: Viewport, tuning: &Tuning) -> Option<Entity> {
        if !viewport.is_valid() {
            return None;
        }

        let roll: f32 = self.rng.random();
        let tier = RarityTier::from_roll(roll, tuning.rarity_thresholds);
        let variant = self.rng.random_range(0..tier.asset_count());

        let x = self.rng.random::<f32>() * viewport.width;
        let pos = Vec2::new(x, viewport.height + tuning.spawn_offset_y);
        let vel = physics::launch_velocity(pos, viewport, tuning);

        Some(Entity {
            id,
            tier,
            pos,
            vel,
            has_entered: false,
            asset: AssetRef { tier, variant },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_thresholds() {
        let t = [0.70, 0.95];
        assert_eq!(RarityTier::from_roll(0.0, t), RarityTier::Common);
        assert_eq!(RarityTier::from_roll(0.6999, t), RarityTier::Common);
        assert_eq!(RarityTier::from_roll(0.70, t), RarityTier::Rare);
        assert_eq!(RarityTier::from_roll(0.9499, t), RarityTier::Rare);
        assert_eq!(RarityTier::from_roll(0.95, t), RarityTier::Legendary);
        assert_eq!(RarityTier::from_roll(0.9999, t), RarityTier::Legendary);
    }

    #[test]
    fn test_point_values() {
        assert_eq!(RarityTier::Common.point_value(), 1);
        assert_eq!(RarityTier::Rare.point_value(), 3);
        assert_eq!(RarityTier::Legendary.point_value(), 5);
    }

    #[test]
    fn test_spawn_below_viewport() {
        let tuning = Tuning::default();
        let viewport = Viewport::new(800.0, 600.0);
        let mut factory = EntityFactory::new(7);

        for i in 0..200 {
            let cat = factory.create(EntityId(i), viewport, &tuning).unwrap();
            assert_eq!(cat.pos.y, 700.0);
            assert!(cat.pos.x >= 0.0 && cat.pos.x < 800.0);
            assert!(!cat.has_entered);
            assert!(cat.vel.y < 0.0);
            assert!(cat.asset.variant < cat.tier.asset_count());
        }
    }

    #[test]
    fn test_invalid_viewport_defers() {
        let tuning = Tuning::default();
        let mut factory = EntityFactory::new(7);
        assert!(factory.create(EntityId(1), Viewport::new(0.0, 600.0), &tuning).is_none());
        assert!(factory.create(EntityId(1), Viewport::new(800.0, 0.0), &tuning).is_none());
    }

    #[test]
    fn test_distribution_roughly_matches() {
        let tuning = Tuning::default();
        let viewport = Viewport::new(400.0, 800.0);
        let mut factory = EntityFactory::new(12345);
        let mut counts = [0u32; 3];
        for i in 0..10_000 {
            let cat = factory.create(EntityId(i), viewport, &tuning).unwrap();
            let slot = match cat.tier {
                RarityTier::Common => 0,
                RarityTier::Rare => 1,
                RarityTier::Legendary => 2,
            };
            counts[slot] += 1;
        }
        assert!((6_500..7_500).contains(&counts[0]), "common: {}", counts[0]);
        assert!((2_000..3_000).contains(&counts[1]), "rare: {}", counts[1]);
        assert!((250..800).contains(&counts[2]), "legendary: {}", counts[2]);
    }

    #[test]
    fn test_same_seed_same_cats() {
        let tuning = Tuning::default();
        let viewport = Viewport::new(800.0, 600.0);
        let mut a = EntityFactory::new(99);
        let mut b = EntityFactory::new(99);
        for i in 0..20 {
            let ca = a.create(EntityId(i), viewport, &tuning).unwrap();
            let cb = b.create(EntityId(i), viewport, &tuning).unwrap();
            assert_eq!(ca.tier, cb.tier);
            assert_eq!(ca.pos, cb.pos);
        }
    }

    #[test]
    fn test_mark_entered_is_one_way() {
        let tuning = Tuning::default();
        let mut factory = EntityFactory::new(1);
        let mut cat = factory
            .create(EntityId(1), Viewport::new(100.0, 100.0), &tuning)
            .unwrap();
        assert!(cat.mark_entered());
        assert!(!cat.mark_entered());
        assert!(cat.has_entered);
    }
}
