//! Arcade Portal entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlCanvasElement, HtmlSelectElement, MouseEvent};

    use arcade_portal::leaderboard::{EMPTY_BOARD_TEXT, Leaderboards};
    use arcade_portal::platform::{
        Clock, LocalStorage, SessionProvider, StoredSession, SystemClock, TimerQueue,
    };
    use arcade_portal::renderer::{CanvasSurface, reflex_scene, render, scroller_scene};
    use arcade_portal::sim::{ReflexEngine, ReflexSummary, ScrollerEngine, ScrollerSummary};
    use arcade_portal::stats::{
        DashboardSummary, Favorite, SESSION_UPDATE_INTERVAL_MS, UserStatsTracker,
    };
    use arcade_portal::accounts::Accounts;
    use arcade_portal::tuning::Difficulty;
    use arcade_portal::{ScoreRecorder, Settings};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum PortalEvent {
        /// Fold elapsed session time into the user's stats
        Heartbeat,
    }

    /// The game hosted on the current page, if any
    enum Page {
        Reflex {
            engine: ReflexEngine,
            surface: CanvasSurface,
            /// Stored best for the shown difficulty
            best: u64,
        },
        Scroller {
            engine: ScrollerEngine,
            surface: CanvasSurface,
        },
        Other,
    }

    /// Portal instance holding all page state
    struct Portal {
        page: Page,
        document: Document,
        settings: Settings,
        tracker: UserStatsTracker<LocalStorage, StoredSession<LocalStorage>>,
        accounts: Accounts<LocalStorage>,
        timers: TimerQueue<PortalEvent>,
    }

    fn recorder() -> ScoreRecorder {
        ScoreRecorder::new(
            Rc::new(LocalStorage),
            Box::new(StoredSession::new(LocalStorage)),
            Rc::new(SystemClock),
        )
        .with_tracker(Box::new(UserStatsTracker::new(
            LocalStorage,
            StoredSession::new(LocalStorage),
        )))
    }

    fn now() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(el: &Element, visible: bool) {
        let _ = el.class_list().toggle_with_force("hidden", !visible);
    }

    fn alert(message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }

    /// Logical size of the `.game-area` container
    fn game_area_size(document: &Document) -> Option<(f32, f32)> {
        let area = document
            .query_selector(".game-area-wrapper .game-area")
            .ok()
            .flatten()?;
        let rect = area.get_bounding_client_rect();
        Some((rect.width() as f32, rect.height() as f32))
    }

    impl Portal {
        fn new(document: Document) -> Self {
            let settings = Settings::load(&LocalStorage);
            let accounts = Accounts::new(LocalStorage, &settings);
            let seed = js_sys::Date::now() as u64;
            let (width, height) = game_area_size(&document).unwrap_or((600.0, 400.0));

            let canvas = |id: &str| -> Option<CanvasSurface> {
                let canvas: HtmlCanvasElement =
                    document.get_element_by_id(id)?.dyn_into().ok()?;
                match CanvasSurface::new(canvas) {
                    Ok(surface) => Some(surface),
                    Err(e) => {
                        log::error!("Canvas {} unusable: {:?}", id, e);
                        None
                    }
                }
            };

            let page = if let Some(mut surface) = canvas("jumpy-canvas") {
                let engine = ScrollerEngine::new(recorder(), width, height, seed);
                let view = engine.snapshot().viewport;
                surface.resize(view.width, view.height);
                Page::Scroller { engine, surface }
            } else if let Some(mut surface) = canvas("reflex-canvas") {
                let mut engine = ReflexEngine::new(recorder(), seed)
                    .with_round_secs(settings.effective_round_secs());
                engine.resize(width, height);
                surface.resize(width, height);
                Page::Reflex {
                    engine,
                    surface,
                    best: 0,
                }
            } else {
                Page::Other
            };

            let mut timers = TimerQueue::new();
            timers.schedule_repeating(now(), SESSION_UPDATE_INTERVAL_MS, PortalEvent::Heartbeat);

            let mut portal = Self {
                page,
                document,
                settings,
                tracker: UserStatsTracker::new(LocalStorage, StoredSession::new(LocalStorage)),
                accounts,
                timers,
            };
            portal.refresh_best();
            portal
        }

        /// Re-read the stored best shown in the HUD. The running round's
        /// difficulty wins over the selector.
        fn refresh_best(&mut self) {
            let key = self.difficulty_key();
            if let Page::Reflex { engine, best, .. } = &mut self.page {
                let difficulty = if engine.snapshot().active {
                    engine.difficulty()
                } else {
                    Difficulty::from_key(&key).unwrap_or(engine.difficulty())
                };
                *best = engine.best_score(difficulty);
            }
        }

        fn difficulty_key(&self) -> String {
            self.document
                .get_element_by_id("difficulty-select")
                .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
                .map(|s| s.value())
                .unwrap_or_else(|| self.settings.default_difficulty.as_str().to_string())
        }

        /// Start/stop button
        fn toggle(&mut self, time: f64) {
            let key = self.difficulty_key();
            match &mut self.page {
                Page::Reflex { engine, .. } => {
                    engine.toggle(&key, time);
                }
                Page::Scroller { engine, .. } => {
                    engine.toggle(time);
                }
                Page::Other => {}
            }
            self.announce();
            self.refresh_best();
        }

        fn jump(&mut self) {
            if let Page::Scroller { engine, .. } = &mut self.page {
                engine.jump();
            }
        }

        fn click(&mut self, x: f32, y: f32, time: f64) {
            if let Page::Reflex { engine, .. } = &mut self.page {
                engine.click(x, y, time);
            }
        }

        fn resize(&mut self) {
            let Some((width, height)) = game_area_size(&self.document) else {
                return;
            };
            match &mut self.page {
                Page::Reflex { engine, surface, .. } => {
                    engine.resize(width, height);
                    surface.resize(width, height);
                }
                Page::Scroller { engine, surface } => {
                    engine.resize(width, height);
                    let view = engine.snapshot().viewport;
                    surface.resize(view.width, view.height);
                }
                Page::Other => {}
            }
        }

        /// Advance timers and physics
        fn update(&mut self, time: f64) {
            while let Some(fired) = self.timers.poll_due(time) {
                match fired.event {
                    PortalEvent::Heartbeat => {
                        let wall = SystemClock.now_ms();
                        self.tracker.update_session_time(wall);
                        if self.accounts.expire_session(wall) {
                            alert("Your session has expired. Please log in again.");
                        }
                    }
                }
            }

            match &mut self.page {
                Page::Reflex { engine, .. } => {
                    engine.advance(time);
                }
                Page::Scroller { engine, .. } => {
                    engine.update(time);
                }
                Page::Other => return,
            }
            self.announce();
        }

        fn render(&mut self) {
            match &mut self.page {
                Page::Reflex { engine, surface, .. } => {
                    render(surface, &reflex_scene(&engine.snapshot()));
                }
                Page::Scroller { engine, surface } => {
                    render(surface, &scroller_scene(&engine.snapshot()));
                }
                Page::Other => {}
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let doc = &self.document;
            let running = match &self.page {
                Page::Reflex { engine, best, .. } => {
                    let snap = engine.snapshot();
                    set_text(doc, "game-score", &snap.score.to_string());
                    set_text(doc, "game-timer", &snap.time_remaining.to_string());
                    set_text(doc, "game-best-score", &best.to_string());
                    if let Some(area) = doc
                        .query_selector(".game-area")
                        .ok()
                        .flatten()
                        .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
                    {
                        let _ = area.style().set_property("background-color", snap.theme_color);
                    }
                    if let Some(select) = doc
                        .get_element_by_id("difficulty-select")
                        .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
                    {
                        select.set_disabled(snap.active);
                    }
                    snap.active
                }
                Page::Scroller { engine, .. } => {
                    let snap = engine.snapshot();
                    set_text(doc, "game-score", &snap.score.to_string());
                    set_text(doc, "game-best-score", &snap.best.to_string());
                    set_text(doc, "level-badge", &snap.level_label);
                    if let Some(banner) = doc.get_element_by_id("level-banner") {
                        let text = snap.banner.filter(|_| self.settings.level_banner);
                        banner.set_text_content(text);
                        let _ = banner.class_list().toggle_with_force("show", text.is_some());
                    }
                    engine.is_running()
                }
                Page::Other => return,
            };

            if let Some(btn) = doc.get_element_by_id("game-start-btn") {
                btn.set_text_content(Some(if running { "Stop Game" } else { "Start Game" }));
                let classes = btn.class_list();
                let _ = classes.toggle_with_force("primary-btn", !running);
                let _ = classes.toggle_with_force("secondary-btn", running);
            }
            if let Some(el) = doc.query_selector(".game-instructions").ok().flatten() {
                set_visible(&el, !running);
            }
        }

        /// Report a finished run, once
        fn announce(&mut self) {
            match &mut self.page {
                Page::Reflex { engine, .. } => {
                    if let Some(ReflexSummary {
                        score, hits, misses, ..
                    }) = engine.take_summary()
                    {
                        self.refresh_best();
                        alert(&format!(
                            "Game Over!\n\nScore: {}\nHit: {}\nMissed: {}",
                            score, hits, misses
                        ));
                    }
                }
                Page::Scroller { engine, .. } => {
                    if let Some(ScrollerSummary { score, best, .. }) = engine.take_summary() {
                        log::info!("Run finished with {} (best {})", score, best);
                    }
                }
                Page::Other => {}
            }
        }
    }

    /// Fill the leaderboard table for the selected game
    fn render_leaderboard(document: &Document, board_id: &str) {
        let boards = Leaderboards::load(&LocalStorage);
        let Some(board) = boards.board(board_id) else {
            return;
        };
        set_text(document, "lb-game-title", &board.title);
        set_text(
            document,
            "lb-game-description",
            board.description.as_deref().unwrap_or(""),
        );

        let Some(tbody) = document.get_element_by_id("leaderboard-body") else {
            return;
        };
        let rows = boards.ranked(board_id);
        if rows.is_empty() {
            tbody.set_inner_html(&format!(
                "<tr><td colspan=\"4\" class=\"empty\">{}</td></tr>",
                EMPTY_BOARD_TEXT
            ));
            return;
        }

        let html: String = rows
            .iter()
            .map(|row| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    row.rank,
                    escape_html(&row.username),
                    row.score,
                    row.date
                )
            })
            .collect();
        tbody.set_inner_html(&html);
    }

    fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
    }

    fn setup_leaderboard(document: &Document) {
        let Some(select) = document
            .get_element_by_id("game-select")
            .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
        else {
            return;
        };
        render_leaderboard(document, &select.value());

        let doc = document.clone();
        let select_clone = select.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            render_leaderboard(&doc, &select_clone.value());
        });
        let _ = select.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn render_dashboard(document: &Document) {
        if document.get_element_by_id("stat-total-games").is_none() {
            return;
        }
        let sessions = StoredSession::new(LocalStorage);
        let Some(session) = sessions.current_session(SystemClock.now_ms()) else {
            return;
        };
        let users = arcade_portal::accounts::Users::load(&LocalStorage);
        let Some(record) = users.get(&session.username) else {
            return;
        };

        let summary = DashboardSummary::for_user(record);
        set_text(document, "stat-total-games", &summary.total_games.to_string());
        set_text(document, "stat-total-time", &summary.total_play_time);
        set_text(document, "stat-game1-best", &summary.game1_best.to_string());
        set_text(document, "stat-game2-best", &summary.game2_best.to_string());
        let favorite = match summary.favorite {
            Favorite::None => "None yet".to_string(),
            Favorite::Game(game) => game.title().to_string(),
            Favorite::Both => "Both".to_string(),
        };
        set_text(document, "stat-favorite", &favorite);
        if let Some(list) = document.get_element_by_id("activity-list") {
            let html: String = summary
                .recent_logins
                .iter()
                .map(|line| format!("<li>{}</li>", escape_html(line)))
                .collect();
            list.set_inner_html(&html);
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Arcade Portal starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        setup_leaderboard(&document);
        render_dashboard(&document);

        let portal = Rc::new(RefCell::new(Portal::new(document.clone())));

        setup_input_handlers(&document, portal.clone());
        setup_session_end(portal.clone());

        // Draw the idle scene before the first frame
        {
            let mut p = portal.borrow_mut();
            p.render();
            p.update_hud();
        }

        request_animation_frame(portal);

        log::info!("Arcade Portal running!");
    }

    fn setup_input_handlers(document: &Document, portal: Rc<RefCell<Portal>>) {
        let window = web_sys::window().expect("no window");

        // Start / stop
        if let Some(btn) = document.get_element_by_id("game-start-btn") {
            let portal = portal.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut p = portal.borrow_mut();
                p.toggle(now());
                p.update_hud();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Difficulty change updates the best shown while idle
        if let Some(select) = document.get_element_by_id("difficulty-select") {
            let portal = portal.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut p = portal.borrow_mut();
                p.refresh_best();
                p.update_hud();
            });
            let _ = select.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Target clicks
        if let Some(canvas) = document.get_element_by_id("reflex-canvas") {
            let portal = portal.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                portal
                    .borrow_mut()
                    .click(event.offset_x() as f32, event.offset_y() as f32, now());
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Space jumps
        {
            let portal = portal.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                if event.code() == "Space" {
                    event.prevent_default();
                    portal.borrow_mut().jump();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Resize
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut p = portal.borrow_mut();
                p.resize();
                p.render();
            });
            let _ = window
                .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_session_end(portal: Rc<RefCell<Portal>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            portal.borrow().tracker.session_ended(SystemClock.now_ms());
        });
        let _ = window
            .add_event_listener_with_callback("beforeunload", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(portal: Rc<RefCell<Portal>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(portal, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(portal: Rc<RefCell<Portal>>, time: f64) {
        {
            let mut p = portal.borrow_mut();
            p.update(time);
            p.render();
            p.update_hud();
        }

        request_animation_frame(portal);
    }

    /// Auth form handlers call these; errors come back as display strings
    #[wasm_bindgen]
    pub fn register(
        username: &str,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<(), JsValue> {
        let settings = Settings::load(&LocalStorage);
        Accounts::new(LocalStorage, &settings)
            .register(username, email, password, confirm, SystemClock.now_ms())
            .map(|_| ())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen]
    pub fn login(username: &str, password: &str) -> Result<(), JsValue> {
        let settings = Settings::load(&LocalStorage);
        Accounts::new(LocalStorage, &settings)
            .login(username, password, SystemClock.now_ms())
            .map(|_| ())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen]
    pub fn logout() -> Result<(), JsValue> {
        let settings = Settings::load(&LocalStorage);
        Accounts::new(LocalStorage, &settings)
            .logout()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Arcade Portal (native) starting...");
    log::info!("The portal runs in the browser - build with `trunk serve` for the web version");

    println!("\nRunning headless demo...");
    demo::reflex_round();
    demo::scroller_run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless runs of both engines with a scripted player
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::rc::Rc;

    use arcade_portal::ScoreRecorder;
    use arcade_portal::leaderboard::Leaderboards;
    use arcade_portal::platform::{ManualClock, MemoryStore, Session};
    use arcade_portal::sim::{ReflexEngine, ScrollerEngine};

    fn recorder(store: &MemoryStore) -> ScoreRecorder {
        ScoreRecorder::new(
            Rc::new(store.clone()),
            Box::new(Some(Session::new("demo", 0.0, 60))),
            Rc::new(ManualClock::new(0.0)),
        )
    }

    /// Clicks every other target the moment it appears
    pub fn reflex_round() {
        let store = MemoryStore::new();
        let mut game = ReflexEngine::new(recorder(&store), 42).with_round_secs(10);
        game.start("medium", 0.0);

        let mut now = 0.0;
        let summary = loop {
            now += 100.0;
            if let Some(summary) = game.advance(now) {
                break summary;
            }
            let newest = game
                .snapshot()
                .targets
                .iter()
                .filter(|t| t.is_active() && t.id % 2 == 0)
                .map(|t| t.id)
                .next_back();
            if let Some(id) = newest {
                game.hit_target(id, now);
            }
        };

        println!(
            "✓ Reflex: {} points ({} hit, {} missed), new best: {}",
            summary.score,
            summary.hits,
            summary.misses,
            summary.outcome.is_new_best()
        );
    }

    /// Flaps whenever the bird sinks below the gap center of the next pipe
    pub fn scroller_run() {
        let store = MemoryStore::new();
        let mut game = ScrollerEngine::new(recorder(&store), 800.0, 600.0, 42);
        game.start(0.0);

        let mut now = 0.0;
        let summary = loop {
            now += 16.0;
            if let Some(summary) = game.update(now) {
                break summary;
            }
            if now > 120_000.0 {
                match game.stop() {
                    Some(summary) => break summary,
                    None => return,
                }
            }
            let snap = game.snapshot();
            let bird = snap.bird;
            let target_y = snap
                .obstacles
                .iter()
                .find(|o| o.trailing_edge() >= bird.pos.x - bird.radius)
                .map(|o| o.gap_top + o.gap_height * 0.5)
                .unwrap_or(snap.viewport.height * 0.5);
            if bird.pos.y > target_y && bird.vel_y > 0.0 {
                game.jump();
            }
        };

        let boards = Leaderboards::load_stored(&store);
        println!(
            "✓ Scroller: {} points ({:?}), best {}, {} leaderboard entr(ies)",
            summary.score,
            summary.reason,
            summary.best,
            boards.ranked("game_2").len()
        );
    }
}
