//! Cat Pop entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlInputElement, PointerEvent};

    use cat_pop::audio::AudioManager;
    use cat_pop::consts::HIT_RADIUS;
    use cat_pop::platform::storage::LocalStorage;
    use cat_pop::services::{Services, StoredProfiles};
    use cat_pop::sim::{GameEvent, GameStatus, RarityTier, SessionStateMachine, Viewport};
    use cat_pop::{LocalScoreService, Settings, Tuning};

    /// Game instance holding all state
    struct Game {
        machine: SessionStateMachine,
        scores: LocalScoreService<LocalStorage>,
        settings: Settings,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        viewport: Viewport,
        last_time: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        /// Measure the canvas and keep its backing store in sync
        fn measure(&mut self) {
            let w = self.canvas.client_width().max(0) as u32;
            let h = self.canvas.client_height().max(0) as u32;
            if self.canvas.width() != w || self.canvas.height() != h {
                self.canvas.set_width(w);
                self.canvas.set_height(h);
            }
            self.viewport = Viewport::new(w as f32, h as f32);
        }

        fn update(&mut self, time: f64) {
            self.last_time = time;
            self.measure();
            self.machine.update(time, self.viewport);

            for event in self.machine.drain_events() {
                match event {
                    GameEvent::GameOver { score } => {
                        log::info!("Game over with {} points", score);
                        if let Some(record) = self.machine.auto_submit(&mut self.scores, time) {
                            log::info!("Score auto-submitted as {}", record);
                        }
                    }
                    GameEvent::LifeLost { lives } => log::info!("Life lost, {} left", lives),
                    _ => {}
                }
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Draw cats and popups
        fn render(&self) {
            let ctx = &self.ctx;
            ctx.clear_rect(0.0, 0.0, self.viewport.width as f64, self.viewport.height as f64);

            let snapshot = self.machine.snapshot();
            if snapshot.status != GameStatus::Playing {
                return;
            }

            for cat in &snapshot.entities {
                let color = match cat.asset.tier {
                    RarityTier::Common => "#f5a623",
                    RarityTier::Rare => "#4a90e2",
                    RarityTier::Legendary => "#bd10e0",
                };
                ctx.set_fill_style_str(color);
                ctx.begin_path();
                let _ = ctx.arc(
                    cat.pos.x as f64,
                    cat.pos.y as f64,
                    (HIT_RADIUS * 0.6) as f64,
                    0.0,
                    std::f64::consts::TAU,
                );
                ctx.fill();
            }

            if self.settings.show_popups {
                ctx.set_fill_style_str("#ffffff");
                ctx.set_font("bold 24px sans-serif");
                for popup in &snapshot.popups {
                    let remaining = ((popup.expires_at_ms - self.last_time)
                        / self.machine.tuning().feedback_duration_ms.max(1.0))
                    .clamp(0.0, 1.0);
                    let rise = (1.0 - remaining) * 40.0;
                    let _ = ctx.fill_text(
                        &format!("+{}", popup.points),
                        popup.pos.x as f64,
                        popup.pos.y as f64 - rise,
                    );
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let status = self.machine.status();

            if let Some(el) = document.query_selector("#hud-score .hud-value").ok().flatten() {
                el.set_text_content(Some(&self.machine.score().to_string()));
            }
            if let Some(el) = document.query_selector("#hud-lives .hud-value").ok().flatten() {
                el.set_text_content(Some(&self.machine.lives().to_string()));
            }
            if let Some(el) = document.query_selector("#hud-fps .hud-value").ok().flatten() {
                el.set_text_content(Some(&self.fps.to_string()));
            }
            set_visible(&document, "hud-fps", self.settings.show_fps);

            for (id, visible_in) in [
                ("landing", GameStatus::Landing),
                ("hud", GameStatus::Playing),
                ("game-over", GameStatus::GameOver),
                ("leaderboard", GameStatus::Leaderboard),
            ] {
                set_visible(&document, id, status == visible_in);
            }

            let local = self.scores.scores();
            if status == GameStatus::Landing {
                let best = local.top_score().map(|s| s.to_string()).unwrap_or_default();
                set_visible(&document, "best-score", !best.is_empty());
                set_text("best-score-value", &best);
            }

            if status == GameStatus::GameOver {
                let score = self.machine.score();
                set_text("final-score", &score.to_string());
                let submitted = self
                    .machine
                    .last_run()
                    .map(|r| r.record_id.is_some())
                    .unwrap_or(false);
                set_visible(&document, "submit-form", !submitted);

                let hint = match local.potential_rank(score) {
                    Some(rank) if !submitted => format!("Save it to claim rank #{}", rank),
                    _ => String::new(),
                };
                set_text("rank-hint", &hint);
            }
        }

        fn render_leaderboard(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let Some(list) = document.get_element_by_id("leaderboard-rows") else {
                return;
            };
            let Some(view) = self.machine.leaderboard() else {
                return;
            };

            let mut html = String::new();
            if view.entries.is_empty() {
                html.push_str("<li>No scores yet. Be the first to join the leaderboard!</li>");
            }
            for (i, entry) in view.entries.iter().enumerate() {
                let highlight = if view.player_rank == Some(i + 1) { " class=\"me\"" } else { "" };
                html.push_str(&format!(
                    "<li{}><span>{}</span><span>{}</span><span>{}</span><span>{}</span></li>",
                    highlight,
                    i + 1,
                    escape(&entry.player_name),
                    entry.score,
                    escape(&entry.date)
                ));
            }
            list.set_inner_html(&html);
        }
    }

    fn escape(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Logger init failed: {}", e).into());
        }

        log::info!("Cat Pop starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.class_list().add_1("hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into()?;

        let settings = Settings::load(&LocalStorage::new());
        let services = Services {
            audio: Box::new(AudioManager::from_settings(&settings)),
            profiles: Box::new(StoredProfiles::new(LocalStorage::new())),
        };
        let seed = js_sys::Date::now() as u64;
        let machine = SessionStateMachine::new(seed, Tuning::default(), services);

        let game = Rc::new(RefCell::new(Game {
            machine,
            scores: LocalScoreService::new(LocalStorage::new()),
            settings,
            canvas: canvas.clone(),
            ctx,
            viewport: Viewport::default(),
            last_time: 0.0,
            frame_times: [0.0; 60],
            frame_index: 0,
            fps: 0,
        }));

        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(game.clone());

        request_animation_frame(game);

        log::info!("Cat Pop running!");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // pointerdown covers mouse and touch; a duplicate resolves to a no-op
        let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
            event.prevent_default();
            let mut g = game.borrow_mut();
            let now = g.last_time;
            let point = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
            g.machine.activate_at(point, HIT_RADIUS, now);
        });
        let _ = canvas
            .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn on_click(id: &str, handler: impl FnMut(web_sys::MouseEvent) + 'static) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(btn) = document.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(handler);
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn input_value(id: &str) -> String {
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .map(|input| input.value())
            .unwrap_or_default()
    }

    /// Toggle the `hidden` class, leaving the page's other classes alone
    fn set_visible(document: &web_sys::Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", !visible);
        }
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        {
            el.set_text_content(Some(text));
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            on_click("start-btn", move |_| {
                let mut g = game.borrow_mut();
                let now = g.last_time;
                g.machine.start(now);
            });
        }
        {
            let game = game.clone();
            on_click("restart-btn", move |_| {
                let mut g = game.borrow_mut();
                let now = g.last_time;
                g.machine.restart(now);
            });
        }
        for id in ["leaderboard-btn", "game-over-leaderboard-btn"] {
            let game = game.clone();
            on_click(id, move |_| {
                let mut g = game.borrow_mut();
                let Game { machine, scores, .. } = &mut *g;
                if machine.show_leaderboard(scores) {
                    g.render_leaderboard();
                }
            });
        }
        {
            let game = game.clone();
            on_click("quit-btn", move |_| {
                game.borrow_mut().machine.quit_to_landing();
            });
        }
        {
            let game = game.clone();
            on_click("back-btn", move |_| {
                game.borrow_mut().machine.close_leaderboard();
            });
        }
        {
            let game = game.clone();
            on_click("submit-btn", move |event| {
                event.prevent_default();
                let email = input_value("email-input");
                let name = input_value("name-input");
                let mut g = game.borrow_mut();
                let now = g.last_time;
                let Game { machine, scores, .. } = &mut *g;
                match machine.submit_score(scores, &email, &name, now) {
                    Ok(record) => {
                        log::info!("Score submitted as {}", record);
                        set_text("submit-error", "");
                    }
                    Err(e) => set_text("submit-error", &e.to_string()),
                }
            });
        }

        // Pre-fill the form with whoever played last
        if let Some(profile) = game.borrow().machine.latest_profile() {
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                let fields = [
                    ("email-input", &profile.email),
                    ("name-input", &profile.display_name),
                ];
                for (id, value) in fields {
                    if let Some(input) = document
                        .get_element_by_id(id)
                        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                    {
                        input.set_value(value);
                    }
                }
            }
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update(time);
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Cat Pop (native) starting...");
    log::info!("Native mode runs a headless demo - serve the wasm build for the real game");

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| cat_pop::platform::now_ms() as u64);
    let max_frames: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(20_000);
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| cat_pop::Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::warn!("Could not load tuning from {}: {} - using defaults", path, e);
                cat_pop::Tuning::default()
            }
        },
        None => cat_pop::Tuning::default(),
    };

    demo::run(seed, max_frames, tuning);
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use cat_pop::platform::MemoryStore;
    use cat_pop::services::Services;
    use cat_pop::sim::{EntityId, GameEvent, GameStatus, SessionStateMachine, Viewport};
    use cat_pop::highscores::MAX_HIGH_SCORES;
    use cat_pop::{LocalScoreService, Tuning};

    /// Chance the auto-player notices a cat on any given frame
    const REACTION_CHANCE: f32 = 0.04;
    const FRAME_MS: f64 = 1000.0 / 60.0;

    /// Play one seeded run with a sloppy auto-player and print the outcome
    pub fn run(seed: u64, max_frames: u32, tuning: Tuning) {
        let viewport = Viewport::new(1280.0, 720.0);
        let mut machine = SessionStateMachine::new(seed, tuning, Services::default());
        let mut scores = LocalScoreService::new(MemoryStore::new());
        let mut player = Pcg32::seed_from_u64(seed ^ 0x5eed);

        machine.start(0.0);
        let mut now = 0.0;
        let mut spawned = 0u32;
        let mut collected = 0u32;

        for _ in 0..max_frames {
            now += FRAME_MS;
            machine.update(now, viewport);

            let visible: Vec<EntityId> = machine
                .session()
                .entities
                .values()
                .filter(|e| e.has_entered)
                .map(|e| e.id)
                .collect();
            for id in visible {
                if player.random::<f32>() < REACTION_CHANCE && machine.activate(id, now).is_some() {
                    collected += 1;
                }
            }

            for event in machine.drain_events() {
                match event {
                    GameEvent::Spawned { .. } => spawned += 1,
                    GameEvent::LifeLost { lives } => {
                        log::info!("t={:.0}ms life lost, {} left", now, lives)
                    }
                    GameEvent::GameOver { score } => {
                        log::info!("t={:.0}ms game over, score {}", now, score)
                    }
                    _ => {}
                }
            }

            if machine.status() == GameStatus::GameOver {
                break;
            }
        }

        println!("Seed:      {}", seed);
        println!("Time:      {:.1}s", now / 1000.0);
        println!("Spawned:   {}", spawned);
        println!("Collected: {}", collected);
        println!("Score:     {}", machine.score());

        if machine.status() != GameStatus::GameOver {
            println!("Run still going after {} frames", max_frames);
            return;
        }

        if let Some(best) = scores.scores().top_score() {
            println!("Best:      {}", best);
        }
        match scores.scores().potential_rank(machine.score()) {
            Some(rank) => println!("Rank:      #{}", rank),
            None => println!("Rank:      outside the top {}", MAX_HIGH_SCORES),
        }

        match machine.submit_score(&mut scores, "demo@example.com", "Demo", now) {
            Ok(record) => println!("Submitted: {}", record),
            Err(e) => println!("Not submitted: {}", e),
        }
        if machine.show_leaderboard(&mut scores) {
            if let Some(view) = machine.leaderboard() {
                for (i, entry) in view.entries.iter().enumerate() {
                    println!(
                        "#{:<2} {:<10} {:>5}  {}",
                        i + 1,
                        entry.player_name,
                        entry.score,
                        entry.date
                    );
                }
            }
        }
    }
}
