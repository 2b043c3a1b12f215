//! Per-cat on-screen lifecycle
//!
//! ```text
//! BelowScreen --(y < h)--> Entered --(y > h)--> Missed
//!      \                      \
//!       +------ collect ------+----> Collected
//! ```
//!
//! `Missed` and `Collected` are terminal and both remove the cat from the
//! registry, so whichever happens first makes the other a no-op.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId};
use super::state::{EntityRegistry, Viewport};
use crate::tuning::Tuning;

/// Lifecycle classification after a physics step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecyclePhase {
    /// Still below the bottom edge, never seen
    BelowScreen,
    /// Has been inside the viewport at least once
    Entered,
    /// Fell back out after entering: costs a life
    Missed,
    /// Never entered and is now falling away below its spawn line
    Discarded,
}

/// Classify a cat against the viewport, latching `has_entered` on the way.
pub fn classify(entity: &mut Entity, viewport: Viewport, tuning: &Tuning) -> LifecyclePhase {
    let height = viewport.height;

    if !entity.has_entered && entity.pos.y < height {
        entity.mark_entered();
    }

    if entity.has_entered {
        if entity.pos.y > height {
            LifecyclePhase::Missed
        } else {
            LifecyclePhase::Entered
        }
    } else if entity.vel.y > 0.0 && entity.pos.y > height + tuning.spawn_offset_y {
        LifecyclePhase::Discarded
    } else {
        LifecyclePhase::BelowScreen
    }
}

/// Result of one lifecycle pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifecycleReport {
    /// Cats that left the screen after entering (already removed)
    pub missed: Vec<EntityId>,
    /// Cats dropped without ever entering (already removed)
    pub discarded: Vec<EntityId>,
    /// Cats that entered the viewport during this pass
    pub entered: Vec<EntityId>,
}

/// Centralized bounds check over the registry, one linear scan per frame
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleTracker;

impl LifecycleTracker {
    /// Classify every cat and remove the terminal ones
    pub fn scan(
        &self,
        entities: &mut EntityRegistry,
        viewport: Viewport,
        tuning: &Tuning,
    ) -> LifecycleReport {
        let mut report = LifecycleReport::default();

        entities.retain(|id, entity| {
            let was_entered = entity.has_entered;
            match classify(entity, viewport, tuning) {
                LifecyclePhase::Missed => {
                    report.missed.push(*id);
                    false
                }
                LifecyclePhase::Discarded => {
                    report.discarded.push(*id);
                    false
                }
                LifecyclePhase::Entered => {
                    if !was_entered {
                        report.entered.push(*id);
                    }
                    true
                }
                LifecyclePhase::BelowScreen => true,
            }
        });

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{AssetRef, RarityTier};
    use glam::Vec2;

    fn cat(id: u32, y: f32, vy: f32, entered: bool) -> Entity {
        Entity {
            id: EntityId(id),
            tier: RarityTier::Common,
            pos: Vec2::new(100.0, y),
            vel: Vec2::new(0.0, vy),
            has_entered: entered,
            asset: AssetRef {
                tier: RarityTier::Common,
                variant: 0,
            },
        }
    }

    #[test]
    fn test_classify_transitions() {
        let tuning = Tuning::default();
        let viewport = Viewport::new(400.0, 600.0);

        let mut below = cat(1, 650.0, -1.0, false);
        assert_eq!(classify(&mut below, viewport, &tuning), LifecyclePhase::BelowScreen);
        assert!(!below.has_entered);

        let mut entering = cat(2, 599.0, -1.0, false);
        assert_eq!(classify(&mut entering, viewport, &tuning), LifecyclePhase::Entered);
        assert!(entering.has_entered);

        let mut falling_out = cat(3, 601.0, 1.0, true);
        assert_eq!(classify(&mut falling_out, viewport, &tuning), LifecyclePhase::Missed);

        // Exactly on the edge is neither entered nor missed
        let mut edge = cat(4, 600.0, -1.0, false);
        assert_eq!(classify(&mut edge, viewport, &tuning), LifecyclePhase::BelowScreen);
        let mut edge_entered = cat(5, 600.0, 1.0, true);
        assert_eq!(classify(&mut edge_entered, viewport, &tuning), LifecyclePhase::Entered);
    }

    #[test]
    fn test_never_entered_is_never_missed() {
        let tuning = Tuning::default();
        let viewport = Viewport::new(400.0, 600.0);

        // Falling but still above the spawn line: keep it
        let mut weak = cat(1, 650.0, 0.5, false);
        assert_eq!(classify(&mut weak, viewport, &tuning), LifecyclePhase::BelowScreen);

        // Below the spawn line and falling: dropped, not missed
        let mut gone = cat(2, 701.0, 0.5, false);
        assert_eq!(classify(&mut gone, viewport, &tuning), LifecyclePhase::Discarded);
    }

    #[test]
    fn test_scan_removes_terminal_cats() {
        let tuning = Tuning::default();
        let viewport = Viewport::new(400.0, 600.0);
        let mut registry = EntityRegistry::new();
        for c in [
            cat(1, 300.0, 0.2, false),
            cat(2, 610.0, 0.5, true),
            cat(3, 800.0, 0.5, false),
            cat(4, 650.0, -0.5, false),
        ] {
            registry.insert(c.id, c);
        }

        let report = LifecycleTracker.scan(&mut registry, viewport, &tuning);
        assert_eq!(report.entered, vec![EntityId(1)]);
        assert_eq!(report.missed, vec![EntityId(2)]);
        assert_eq!(report.discarded, vec![EntityId(3)]);
        assert_eq!(registry.keys().copied().collect::<Vec<_>>(), vec![EntityId(1), EntityId(4)]);

        // A second pass reports nothing new
        let report = LifecycleTracker.scan(&mut registry, viewport, &tuning);
        assert_eq!(report, LifecycleReport::default());
    }
}
