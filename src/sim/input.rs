//! Pointer/tap resolution
//!
//! Activation is guarded by registry membership alone: the first activation
//! removes the cat, so duplicate touch+click events find nothing to collect.
//! The "+points" popup is tracked separately and never gates scoring.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::state::{EntityRegistry, FeedbackPopup};
use crate::within_radius;

/// Authoritative collect, produced at most once per cat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollectEvent {
    pub id: EntityId,
    pub points: u32,
    pub pos: Vec2,
}

/// Turns activations into collect events and keeps the cosmetic popups
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputDispatcher {
    popups: Vec<FeedbackPopup>,
}

impl InputDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect `id` if it is still live. Returns `None` for stale or repeated taps.
    pub fn on_activate(
        &mut self,
        entities: &mut EntityRegistry,
        id: EntityId,
        now_ms: f64,
        feedback_ms: f64,
    ) -> Option<CollectEvent> {
        let entity = entities.remove(&id)?;
        let event = CollectEvent {
            id,
            points: entity.point_value(),
            pos: entity.pos,
        };

        self.popups.retain(|p| p.id != id);
        self.popups.push(FeedbackPopup {
            id,
            pos: entity.pos,
            points: event.points,
            expires_at_ms: now_ms + feedback_ms,
        });

        Some(event)
    }

    /// Topmost live cat within `radius` of `point` (newest wins on overlap)
    pub fn hit_test(entities: &EntityRegistry, point: Vec2, radius: f32) -> Option<EntityId> {
        entities
            .values()
            .rev()
            .find(|e| within_radius(e.pos, point, radius))
            .map(|e| e.id)
    }

    /// Drop the popup for `id`. No-op if it is already gone.
    pub fn expire(&mut self, id: EntityId) -> bool {
        let before = self.popups.len();
        self.popups.retain(|p| p.id != id);
        self.popups.len() != before
    }

    pub fn popups(&self) -> &[FeedbackPopup] {
        &self.popups
    }

    /// Forget all popups (session teardown)
    pub fn clear(&mut self) {
        self.popups.clear();
    }
}
