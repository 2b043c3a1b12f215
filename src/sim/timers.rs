//! Cooperative one-shot timers
//!
//! Timers are plain data polled by the owner each frame.
//! [`TimerQueue::invalidate`] drops everything pending, so a torn-down run
//! can never fire into the next one.

use serde::{Deserialize, Serialize};

use super::entity::EntityId;

/// Work a timer performs when due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerAction {
    /// One cat of a staggered burst
    Spawn,
    /// Remove the "+points" popup for a collected cat
    ExpireFeedback(EntityId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Timer {
    due_ms: f64,
    /// Schedule order, breaks ties between equal due times
    seq: u64,
    action: TimerAction,
}

/// Pending one-shot timers for a session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimerQueue {
    timers: Vec<Timer>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Schedule `action` to fire at or after `due_ms`
    pub fn schedule(&mut self, due_ms: f64, action: TimerAction) {
        self.timers.push(Timer {
            due_ms,
            seq: self.next_seq,
            action,
        });
        self.next_seq += 1;
    }

    /// Cancel everything pending
    pub fn invalidate(&mut self) {
        self.timers.clear();
    }

    /// Remove and return due actions, earliest first (ties in schedule order)
    pub fn take_due(&mut self, now_ms: f64) -> Vec<TimerAction> {
        let mut due: Vec<Timer> = Vec::new();
        self.timers.retain(|timer| {
            if timer.due_ms <= now_ms {
                due.push(timer.clone());
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| {
            a.due_ms
                .partial_cmp(&b.due_ms)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.seq.cmp(&b.seq))
        });
        due.into_iter().map(|t| t.action).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_due_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(300.0, TimerAction::ExpireFeedback(EntityId(2)));
        queue.schedule(100.0, TimerAction::Spawn);
        queue.schedule(100.0, TimerAction::ExpireFeedback(EntityId(1)));

        assert!(queue.take_due(50.0).is_empty());
        assert_eq!(
            queue.take_due(100.0),
            vec![TimerAction::Spawn, TimerAction::ExpireFeedback(EntityId(1))]
        );
        assert_eq!(queue.len(), 1);
        assert_eq!(
            queue.take_due(1000.0),
            vec![TimerAction::ExpireFeedback(EntityId(2))]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_invalidate_cancels_pending() {
        let mut queue = TimerQueue::new();
        queue.schedule(100.0, TimerAction::Spawn);
        queue.schedule(200.0, TimerAction::ExpireFeedback(EntityId(3)));
        queue.invalidate();
        assert!(queue.is_empty());
        assert!(queue.take_due(1_000.0).is_empty());

        queue.schedule(100.0, TimerAction::Spawn);
        assert_eq!(queue.take_due(100.0), vec![TimerAction::Spawn]);
    }
}
