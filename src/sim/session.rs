//! Session state machine
//!
//! ```text
//! Landing --start--> Playing --lives == 0--> GameOver --restart--> Playing
//!    \                                         /
//!     +------------> Leaderboard <------------+   (view only)
//! ```
//!
//! The machine owns the only entity registry. The host drives it from two
//! cooperative callbacks: the per-frame pass ([`SessionStateMachine::advance_frame`])
//! and the spawn check ([`SessionStateMachine::check_spawns`]); one-shot timers
//! are fired by [`SessionStateMachine::run_timers`]. Every entry point re-checks
//! that a run is live before touching anything.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{EntityFactory, EntityId};
use super::input::{CollectEvent, InputDispatcher};
use super::spawn::SpawnScheduler;
use super::state::{
    EntityView, GameEvent, GameSession, GameStatus, SessionSnapshot, Viewport,
};
use super::tick::{clamp_dt, tick};
use super::timers::{TimerAction, TimerQueue};
use crate::services::{
    LeaderboardEntry, PlayerProfile, RecordId, ScoreService, Services, SoundCue, SubmitError,
    fetch_leaderboard, validate_submission,
};
use crate::tuning::Tuning;

/// Number of rows requested for the leaderboard view
pub const LEADERBOARD_LIMIT: usize = 10;

/// Outcome of a finished run, kept until the next start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub score: u64,
    /// Set once the score has been accepted by the backend
    pub record_id: Option<RecordId>,
}

/// Leaderboard screen contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardView {
    pub entries: Vec<LeaderboardEntry>,
    /// 1-based rank of the last submitted run, if it made the list
    pub player_rank: Option<usize>,
}

/// Owns one player's game: score, lives, cats, timers and collaborators
pub struct SessionStateMachine {
    session: GameSession,
    tuning: Tuning,
    factory: EntityFactory,
    scheduler: SpawnScheduler,
    timers: TimerQueue,
    input: InputDispatcher,
    services: Services,
    viewport: Viewport,
    last_frame_ms: Option<f64>,
    deferred_spawns: u32,
    /// Never reset, so ids are unique across runs
    next_id: u32,
    last_run: Option<RunResult>,
    leaderboard: Option<LeaderboardView>,
    /// Where closing the leaderboard returns to
    leaderboard_return: GameStatus,
    events: Vec<GameEvent>,
}

impl SessionStateMachine {
    pub fn new(seed: u64, tuning: Tuning, services: Services) -> Self {
        Self {
            session: GameSession::new(tuning.starting_lives),
            factory: EntityFactory::new(seed),
            scheduler: SpawnScheduler::new(0.0),
            timers: TimerQueue::new(),
            input: InputDispatcher::new(),
            services,
            viewport: Viewport::default(),
            last_frame_ms: None,
            deferred_spawns: 0,
            next_id: 1,
            last_run: None,
            leaderboard: None,
            leaderboard_return: GameStatus::Landing,
            events: Vec::new(),
            tuning,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.session.status
    }

    pub fn score(&self) -> u64 {
        self.session.score
    }

    pub fn lives(&self) -> u32 {
        self.session.lives
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn last_run(&self) -> Option<&RunResult> {
        self.last_run.as_ref()
    }

    pub fn leaderboard(&self) -> Option<&LeaderboardView> {
        self.leaderboard.as_ref()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Take all events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn set_status(&mut self, to: GameStatus) {
        let from = self.session.status;
        if from == to {
            return;
        }
        self.session.status = to;
        log::info!("Status {:?} -> {:?}", from, to);
        self.events.push(GameEvent::StatusChanged { from, to });
    }

    /// Cancel everything scheduled for the current run
    fn teardown(&mut self) {
        self.timers.invalidate();
        self.input.clear();
        self.session.entities.clear();
        self.deferred_spawns = 0;
        self.last_frame_ms = None;
    }

    /// Begin a fresh run from any state
    pub fn start(&mut self, now_ms: f64) {
        self.teardown();
        self.session.reset(self.tuning.starting_lives);
        self.scheduler.reset(now_ms);
        self.last_frame_ms = Some(now_ms);
        self.last_run = None;
        self.leaderboard = None;
        self.set_status(GameStatus::Playing);
    }

    /// Explicit restart after game over
    pub fn restart(&mut self, now_ms: f64) {
        log::info!("Restarting run (previous score {})", self.session.score);
        self.start(now_ms);
    }

    /// Leave play without finishing the run
    pub fn quit_to_landing(&mut self) {
        self.teardown();
        self.session.reset(self.tuning.starting_lives);
        self.leaderboard = None;
        self.set_status(GameStatus::Landing);
    }

    /// Open the leaderboard from the landing or game-over screen
    pub fn show_leaderboard(&mut self, service: &mut dyn ScoreService) -> bool {
        let from = self.session.status;
        if !matches!(from, GameStatus::Landing | GameStatus::GameOver) {
            return false;
        }

        let entries = fetch_leaderboard(service, LEADERBOARD_LIMIT);
        let record = self.last_run.as_ref().and_then(|r| r.record_id.as_ref());
        let player_rank = record.and_then(|id| {
            entries
                .iter()
                .position(|e| e.record_id.as_ref() == Some(id))
                .map(|i| i + 1)
        });

        self.leaderboard = Some(LeaderboardView {
            entries,
            player_rank,
        });
        self.leaderboard_return = from;
        self.set_status(GameStatus::Leaderboard);
        true
    }

    /// Return from the leaderboard to wherever it was opened from
    pub fn close_leaderboard(&mut self) {
        if self.session.status == GameStatus::Leaderboard {
            self.set_status(self.leaderboard_return);
        }
    }

    /// Per-frame pass: physics, lifecycle, misses
    pub fn advance_frame(&mut self, now_ms: f64, viewport: Viewport) {
        if !self.session.is_playing() {
            return;
        }
        self.viewport = viewport;

        let last = self.last_frame_ms.unwrap_or(now_ms);
        self.last_frame_ms = Some(now_ms);
        if !viewport.is_valid() {
            return;
        }
        let dt = clamp_dt(now_ms - last, &self.tuning);

        let report = tick(&mut self.session.entities, viewport, dt, &self.tuning);
        for id in report.discarded {
            log::debug!("{} dropped without entering", id);
            self.events.push(GameEvent::Discarded { id });
        }
        for id in report.missed {
            self.handle_miss(id);
        }

        // Replay the held-back burst with its usual stagger
        let pending = std::mem::take(&mut self.deferred_spawns);
        for i in 0..pending {
            let delay = i as f64 * self.tuning.spawn_stagger_ms;
            self.timers.schedule(now_ms + delay, TimerAction::Spawn);
        }
    }

    fn handle_miss(&mut self, id: EntityId) {
        if !self.session.is_playing() {
            return;
        }
        self.session.lives = self.session.lives.saturating_sub(1);
        self.events.push(GameEvent::Missed { id });
        self.events.push(GameEvent::LifeLost {
            lives: self.session.lives,
        });
        log::debug!("{} missed, {} lives left", id, self.session.lives);

        if self.session.lives == 0 {
            self.game_over();
        }
    }

    fn game_over(&mut self) {
        let score = self.session.score;
        self.teardown();
        self.last_run = Some(RunResult {
            score,
            record_id: None,
        });
        self.events.push(GameEvent::GameOver { score });
        self.services.audio.play(SoundCue::GameOver);
        self.set_status(GameStatus::GameOver);
    }

    /// Periodic spawn check: schedules a staggered burst when one is due
    pub fn check_spawns(&mut self, now_ms: f64) {
        if !self.session.is_playing() {
            return;
        }
        let delays = self
            .scheduler
            .check(now_ms, self.session.score, &self.tuning);
        for delay in delays {
            self.timers.schedule(now_ms + delay, TimerAction::Spawn);
        }
    }

    /// Fire due one-shot timers
    pub fn run_timers(&mut self, now_ms: f64, viewport: Viewport) {
        if !self.session.is_playing() {
            return;
        }
        self.viewport = viewport;

        for action in self.timers.take_due(now_ms) {
            match action {
                TimerAction::Spawn => self.spawn_one(),
                TimerAction::ExpireFeedback(id) => {
                    self.input.expire(id);
                }
            }
        }
    }

    /// One host frame: physics, then due timers, then the spawn check
    pub fn update(&mut self, now_ms: f64, viewport: Viewport) {
        self.advance_frame(now_ms, viewport);
        self.run_timers(now_ms, viewport);
        self.check_spawns(now_ms);
    }

    fn spawn_one(&mut self) {
        // A burst can outlive the run that scheduled it
        if !self.session.is_playing() {
            return;
        }
        if !self.viewport.is_valid() {
            self.defer_spawn();
            return;
        }

        let id = EntityId(self.next_id);
        let Some(entity) = self.factory.create(id, self.viewport, &self.tuning) else {
            self.defer_spawn();
            return;
        };
        self.next_id += 1;

        log::debug!("Spawned {} ({})", id, entity.tier.as_str());
        self.events.push(GameEvent::Spawned {
            id,
            tier: entity.tier,
        });
        self.session.entities.insert(id, entity);
        self.services.audio.play(SoundCue::Pop);
    }

    /// Hold a spawn until the viewport is measured. At most one batch is kept.
    fn defer_spawn(&mut self) {
        let cap = self.session.spawn_batch_size();
        if self.deferred_spawns < cap {
            self.deferred_spawns += 1;
            log::debug!("Viewport not measured yet, deferring spawn");
        }
    }

    /// Player tapped a cat. Repeated or late taps return `None`.
    pub fn activate(&mut self, id: EntityId, now_ms: f64) -> Option<CollectEvent> {
        if !self.session.is_playing() {
            return None;
        }
        let event = self.input.on_activate(
            &mut self.session.entities,
            id,
            now_ms,
            self.tuning.feedback_duration_ms,
        )?;

        self.session.score += event.points as u64;
        self.services.audio.play(SoundCue::Click);
        self.events.push(GameEvent::Collected {
            id,
            points: event.points,
        });
        self.events.push(GameEvent::ScoreChanged {
            delta: event.points,
            score: self.session.score,
        });
        self.timers.schedule(
            now_ms + self.tuning.feedback_duration_ms,
            TimerAction::ExpireFeedback(id),
        );

        Some(event)
    }

    /// Resolve a raw pointer position and activate whatever is under it
    pub fn activate_at(
        &mut self,
        point: Vec2,
        radius: f32,
        now_ms: f64,
    ) -> Option<CollectEvent> {
        if !self.session.is_playing() {
            return None;
        }
        let id = InputDispatcher::hit_test(&self.session.entities, point, radius)?;
        self.activate(id, now_ms)
    }

    /// Most recent player identity, for pre-filling the submit form
    pub fn latest_profile(&self) -> Option<PlayerProfile> {
        self.services.profiles.latest()
    }

    /// Submit the finished run's score. Retries reuse the record id issued by
    /// the first successful call, so the backend never sees the run twice.
    pub fn submit_score(
        &mut self,
        service: &mut dyn ScoreService,
        email: &str,
        display_name: &str,
        now_ms: f64,
    ) -> Result<RecordId, SubmitError> {
        let Some(run) = self.last_run.as_ref() else {
            return Err(SubmitError::NotFinished);
        };
        let (email, display_name) = validate_submission(email, display_name)?;

        let record = service
            .submit_score(email, display_name, run.score, run.record_id.as_ref())
            .map_err(|e| {
                log::warn!("Score submission failed: {}", e);
                SubmitError::from(e)
            })?;

        if let Some(run) = self.last_run.as_mut() {
            run.record_id = Some(record.clone());
        }
        self.services.profiles.remember(PlayerProfile {
            email: email.to_string(),
            display_name: display_name.to_string(),
            saved_at_ms: now_ms,
        });
        Ok(record)
    }

    /// Submit with the remembered profile, once per finished run
    pub fn auto_submit(
        &mut self,
        service: &mut dyn ScoreService,
        now_ms: f64,
    ) -> Option<RecordId> {
        let run = self.last_run.as_ref()?;
        if run.record_id.is_some() {
            return None;
        }
        let profile = self.latest_profile()?;
        self.submit_score(service, &profile.email, &profile.display_name, now_ms)
            .ok()
    }

    /// Read-only view for the presentation layer
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.session.status,
            score: self.session.score,
            lives: self.session.lives,
            difficulty_tier: self.session.difficulty_tier(),
            entities: self
                .session
                .entities
                .values()
                .map(EntityView::from)
                .collect(),
            popups: self.input.popups().to_vec(),
        }
    }
}
