//! Ballistic motion under constant screen-space gravity
//!
//! Semi-implicit Euler: velocity is updated first, then position uses the new
//! velocity. Time is in milliseconds, distance in pixels, +y is down.

use glam::Vec2;

use super::state::Viewport;
use crate::center_x;
use crate::tuning::Tuning;

/// Launch boost: taller viewports get a stronger kick
#[inline]
pub fn boost_factor(viewport_height: f32, tuning: &Tuning) -> f32 {
    1.0 + viewport_height / tuning.boost_divisor
}

/// Upward speed that would carry a projectile from `start_y` exactly to the
/// vertical center under gravity, before the boost is applied
#[inline]
pub fn base_launch_speed(start_y: f32, viewport_height: f32, gravity: f32) -> f32 {
    let center_y = viewport_height / 2.0;
    let distance = (start_y - center_y).abs();
    (2.0 * gravity * distance).sqrt()
}

/// Initial velocity for a cat spawned at `spawn`
pub fn launch_velocity(spawn: Vec2, viewport: Viewport, tuning: &Tuning) -> Vec2 {
    let base_vy = base_launch_speed(spawn.y, viewport.height, tuning.gravity);
    let vy = -base_vy * boost_factor(viewport.height, tuning);
    let vx = if spawn.x < center_x(viewport.width) {
        tuning.horizontal_drift
    } else {
        -tuning.horizontal_drift
    };
    Vec2::new(vx, vy)
}

/// Advance one step of `dt` milliseconds. Returns the new (position, velocity).
#[inline]
pub fn integrate(pos: Vec2, vel: Vec2, dt: f32, gravity: f32) -> (Vec2, Vec2) {
    let vel = Vec2::new(vel.x, vel.y + gravity * dt);
    let pos = pos + vel * dt;
    (pos, vel)
}

/// Time (ms) until vertical velocity reaches zero. `None` if already falling.
pub fn apex_time(vel: Vec2, gravity: f32) -> Option<f32> {
    if vel.y >= 0.0 {
        None
    } else {
        Some(-vel.y / gravity)
    }
}
