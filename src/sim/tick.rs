//! Per-frame simulation pass
//!
//! Integrates every live cat, then runs the lifecycle scan over the updated
//! positions. The registry is borrowed for the duration of the call only.

use super::lifecycle::{LifecycleReport, LifecycleTracker};
use super::physics::integrate;
use super::state::{EntityRegistry, Viewport};
use crate::tuning::Tuning;

/// Clamp a raw frame delta to what the integrator accepts
pub fn clamp_dt(raw_dt_ms: f64, tuning: &Tuning) -> f32 {
    if !raw_dt_ms.is_finite() || raw_dt_ms <= 0.0 {
        return 0.0;
    }
    (raw_dt_ms as f32).min(tuning.max_frame_dt_ms)
}

/// Advance all cats by `dt_ms` and classify them
pub fn tick(
    entities: &mut EntityRegistry,
    viewport: Viewport,
    dt_ms: f32,
    tuning: &Tuning,
) -> LifecycleReport {
    for entity in entities.values_mut() {
        let (pos, vel) = integrate(entity.pos, entity.vel, dt_ms, tuning.gravity);
        entity.pos = pos;
        entity.vel = vel;
    }

    LifecycleTracker.scan(entities, viewport, tuning)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{EntityFactory, EntityId};

    #[test]
    fn test_clamp_dt() {
        let tuning = Tuning::default();
        assert_eq!(clamp_dt(16.0, &tuning), 16.0);
        assert_eq!(clamp_dt(5_000.0, &tuning), 100.0);
        assert_eq!(clamp_dt(-3.0, &tuning), 0.0);
        assert_eq!(clamp_dt(f64::NAN, &tuning), 0.0);
    }

    #[test]
    fn test_full_arc_enters_then_misses() {
        let tuning = Tuning::default();
        let viewport = Viewport::new(800.0, 600.0);
        let mut factory = EntityFactory::new(3);
        let cat = factory.create(EntityId(1), viewport, &tuning).unwrap();
        let mut registry = EntityRegistry::new();
        registry.insert(cat.id, cat);

        let mut entered_at = None;
        let mut missed_at = None;
        for frame in 0..2_000 {
            let report = tick(&mut registry, viewport, 16.0, &tuning);
            if !report.entered.is_empty() {
                entered_at.get_or_insert(frame);
            }
            if !report.missed.is_empty() {
                missed_at = Some(frame);
                break;
            }
            assert!(report.discarded.is_empty());
        }

        let entered_at = entered_at.expect("cat should come on screen");
        let missed_at = missed_at.expect("cat should fall back out");
        assert!(missed_at > entered_at);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_weak_launch_is_discarded_without_miss() {
        let tuning = Tuning {
            boost_divisor: 1.0e9,
            ..Tuning::default()
        };
        let viewport = Viewport::new(800.0, 600.0);
        let mut factory = EntityFactory::new(3);
        let mut cat = factory.create(EntityId(1), viewport, &tuning).unwrap();
        // Barely any upward speed: apex stays below the bottom edge
        cat.vel.y = -0.1;
        let mut registry = EntityRegistry::new();
        registry.insert(cat.id, cat);

        let mut discarded = false;
        for _ in 0..500 {
            let report = tick(&mut registry, viewport, 16.0, &tuning);
            assert!(report.missed.is_empty());
            assert!(report.entered.is_empty());
            if !report.discarded.is_empty() {
                discarded = true;
                break;
            }
        }
        assert!(discarded);
        assert!(registry.is_empty());
    }
}
