//! Number Blocks entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Document, Element, KeyboardEvent, MouseEvent, Response, TouchEvent};

    use number_blocks::audio::AudioManager;
    use number_blocks::consts::*;
    use number_blocks::playback::{celebration_html, tile_html};
    use number_blocks::presentation::CELEBRATION_MS;
    use number_blocks::sim::{Cell, Command, GameEvent, GamePhase, GameState, apply_command, tick};
    use number_blocks::speech::{SpeechStyle, Speaker, number_utterance};
    use number_blocks::{BoardView, Cue, EventPacer, PhraseQueue, Settings, Tuning, cues_for};

    /// Longest frame gap fed to the fall timer (ms)
    const MAX_FRAME_MS: f64 = 250.0;
    /// Minimum horizontal travel for a swipe (px)
    const SWIPE_THRESHOLD: f64 = 30.0;

    /// Game instance holding all state
    struct Game {
        state: GameState,
        /// What the player currently sees; trails `state` while merges play out
        view: BoardView,
        pacer: EventPacer,
        phrases: PhraseQueue,
        settings: Settings,
        audio: AudioManager,
        speaker: Speaker,
        /// Board cells in row-major order
        cells: Vec<Element>,
        last_time: f64,
        /// Frame time at which the combo banner hides
        banner_until: f64,
        /// Frame time at which the floating emoji goes away
        celebration_until: f64,
        /// Paused because the tab was hidden (resume when visible)
        paused_by_visibility: bool,
        touch_start_x: Option<f64>,
        /// Board needs repainting
        dirty: bool,
        voice_ready: bool,
    }

    impl Game {
        fn new(tuning: Tuning, settings: Settings, seed: u64) -> Self {
            Self {
                state: GameState::new(tuning, seed),
                view: BoardView::new(),
                pacer: EventPacer::new(),
                phrases: PhraseQueue::default(),
                audio: AudioManager::new(&settings),
                speaker: Speaker::new(),
                settings,
                cells: Vec::new(),
                last_time: 0.0,
                banner_until: 0.0,
                celebration_until: 0.0,
                paused_by_visibility: false,
                touch_start_x: None,
                dirty: true,
                voice_ready: false,
            }
        }

        /// Apply a player command and play its cues right away (inside the
        /// user gesture, so audio and speech are allowed to start)
        fn command(&mut self, command: Command) {
            match command {
                Command::Start | Command::Exit => {
                    self.pacer.clear();
                    self.phrases.clear();
                }
                // The piece stays put until the merge animation is over
                Command::MoveLeft | Command::MoveRight | Command::DropFast
                    if !self.pacer.is_idle() =>
                {
                    return;
                }
                _ => {}
            }

            if command == Command::Start {
                self.audio.resume();
                self.state = GameState::new(self.state.tuning.clone(), js_sys::Date::now() as u64);
                log::info!("Game started with seed: {}", self.state.seed);
            }
            apply_command(&mut self.state, command);
            self.flush_events();
        }

        /// Advance the fall timer and the paced replay
        fn update(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                (time - self.last_time).clamp(0.0, MAX_FRAME_MS)
            } else {
                0.0
            };
            self.last_time = time;

            if !self.voice_ready {
                self.voice_ready = self.speaker.refresh_voice();
            }

            if self.pacer.is_idle() {
                tick(&mut self.state, dt as u32);
            }
            self.flush_events();

            if let Some(text) = self.phrases.take_due(time) {
                self.speaker.speak(&text, SpeechStyle::PHRASE);
            }
            if self.view.celebration.is_some() && time >= self.celebration_until {
                self.view.celebration = None;
                self.dirty = true;
            }
            self.audio.update(self.speaker.is_speaking());
        }

        /// Queue new game events and show the ones that are due
        fn flush_events(&mut self) {
            let events = self.state.drain_events();
            if !events.is_empty() {
                self.pacer.push(self.last_time, events);
            }

            for event in self.pacer.release(self.last_time) {
                self.view.apply(&event);
                self.dirty = true;
                if matches!(event, GameEvent::MergeCompleted { .. }) {
                    self.celebration_until = self.last_time + f64::from(CELEBRATION_MS);
                }
                for cue in cues_for(&event, &self.settings) {
                    self.play_cue(cue);
                }
            }
        }

        fn play_cue(&mut self, cue: Cue) {
            match cue {
                Cue::Sound(effect) => self.audio.play(effect),
                Cue::SayNumber { value, excited } => {
                    if let Some((text, style)) = number_utterance(value, excited) {
                        self.speaker.speak(&text, style);
                    }
                }
                Cue::SayAfter { text, delay_ms } => {
                    self.phrases.push(self.last_time + f64::from(delay_ms), text);
                }
                Cue::Banner { text, duration_ms } => {
                    if let Some(el) = document().and_then(|d| d.get_element_by_id("combo-display")) {
                        el.set_text_content(Some(&text));
                        let _ = el.set_attribute("class", "show");
                    }
                    self.banner_until = self.last_time + f64::from(duration_ms);
                }
                Cue::StartMusic => self.audio.start_music(),
                Cue::StopMusic => self.audio.stop_music(),
                Cue::Silence => {
                    self.phrases.clear();
                    self.speaker.cancel();
                }
            }
        }

        fn toggle_sound(&mut self) {
            let on = self.settings.toggle_sound();
            if !on {
                self.phrases.clear();
                self.speaker.cancel();
            }
            self.audio.apply_settings(&self.settings);
            set_text("sound-btn", if on { "🔊" } else { "🔇" });
            log::info!("Sound {}", if on { "on" } else { "off" });
        }

        fn toggle_music(&mut self) {
            let on = self.settings.toggle_music();
            self.audio.apply_settings(&self.settings);
            if on && self.state.is_playing() {
                self.audio.start_music();
            }
            set_text("music-btn", if on { "🎵" } else { "🔕" });
            log::info!("Music {}", if on { "on" } else { "off" });
        }

        /// Repaint the board cells from the view
        fn render_board(&mut self) {
            if !self.dirty {
                return;
            }
            self.dirty = false;

            for (index, el) in self.cells.iter().enumerate() {
                let cell = Cell::new(index / COLS, index % COLS);
                let active = self.view.piece.is_some_and(|p| p.cell == cell);
                let combining = self.view.combining.contains(&cell);
                let mut html = tile_html(self.view.value_at(cell), active, combining);
                if let Some((at, emoji)) = &self.view.celebration {
                    if *at == cell {
                        html.push_str(&celebration_html(emoji));
                    }
                }
                el.set_inner_html(&html);
            }

            if let Some(el) = document().and_then(|d| d.get_element_by_id("next-block")) {
                el.set_inner_html(&tile_html(self.view.next_value.unwrap_or(0), false, false));
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = document() else { return };

            set_text("score", &self.view.score.to_string());
            set_text("level", &self.view.level.to_string());

            // Hide the combo banner once its time is up
            if self.banner_until > 0.0 && self.last_time >= self.banner_until {
                if let Some(el) = document.get_element_by_id("combo-display") {
                    let _ = el.set_attribute("class", "");
                }
            }

            show_if(&document, "start-screen", self.state.phase == GamePhase::Idle);

            // Wait for the last merge to play out before showing the result
            let over = self.state.phase == GamePhase::GameOver && self.pacer.is_idle();
            show_if(&document, "game-over", over);
            if over {
                set_text("final-score-value", &self.state.score.to_string());
            }
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
            el.set_text_content(Some(text));
        }
    }

    fn show_if(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    /// Fetch a text resource
    async fn fetch_text(url: &str) -> Result<String, JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let response: Response = JsFuture::from(window.fetch_with_str(url))
            .await?
            .dyn_into()?;
        if !response.ok() {
            return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
        }
        let text = JsFuture::from(response.text()?).await?;
        text.as_string()
            .ok_or_else(|| JsValue::from_str("response is not text"))
    }

    /// Preferences passed in by the page as `<body data-settings='{...}'>`
    fn page_settings(document: &Document) -> Settings {
        let Some(json) = document
            .body()
            .and_then(|body| body.get_attribute("data-settings"))
        else {
            return Settings::default();
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("Ignoring invalid data-settings ({})", e);
            Settings::default()
        })
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Number Blocks starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let levels_json = match fetch_text("levels/levels.json").await {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("Failed to fetch levels: {:?}", e);
                None
            }
        };
        let tuning = Tuning::load_or_default(levels_json.as_deref());
        let settings = page_settings(&document);

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(tuning, settings, seed)));

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        setup_board(&document, game.clone());
        setup_buttons(&document, game.clone());
        setup_keyboard(game.clone());
        setup_auto_pause(&document, game.clone());

        // Start game loop
        request_animation_frame(game);

        log::info!("Number Blocks running!");
    }

    /// Build the grid cells and the swipe handlers
    fn setup_board(document: &Document, game: Rc<RefCell<Game>>) {
        let Some(board) = document.get_element_by_id("game-board") else {
            log::error!("No #game-board element");
            return;
        };
        board.set_inner_html("");

        let mut cells = Vec::with_capacity(ROWS * COLS);
        for _ in 0..ROWS * COLS {
            let Ok(cell) = document.create_element("div") else {
                continue;
            };
            let _ = cell.set_attribute("class", "cell");
            let _ = board.append_child(&cell);
            cells.push(cell);
        }
        game.borrow_mut().cells = cells;

        // Swipe start
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                if let Some(touch) = event.changed_touches().get(0) {
                    game.borrow_mut().touch_start_x = Some(f64::from(touch.client_x()));
                }
            });
            let _ = board
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Swipe end
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                let mut g = game.borrow_mut();
                let Some(start_x) = g.touch_start_x.take() else {
                    return;
                };
                let Some(touch) = event.changed_touches().get(0) else {
                    return;
                };
                let dx = f64::from(touch.client_x()) - start_x;
                if dx > SWIPE_THRESHOLD {
                    g.command(Command::MoveRight);
                } else if dx < -SWIPE_THRESHOLD {
                    g.command(Command::MoveLeft);
                }
            });
            let _ = board
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(document: &Document, id: &str, mut handler: impl FnMut() + 'static) {
        let Some(btn) = document.get_element_by_id(id) else {
            log::warn!("No #{} button", id);
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| handler());
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Fire on press rather than on release: `mousedown`, or `touchstart`
    /// with the emulated mouse events suppressed
    fn on_press<F: FnMut() + 'static>(document: &Document, id: &str, handler: F) {
        let Some(btn) = document.get_element_by_id(id) else {
            log::warn!("No #{} button", id);
            return;
        };
        let handler = Rc::new(RefCell::new(handler));

        {
            let handler = handler.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut press = handler.borrow_mut();
                (*press)();
            });
            let _ = btn
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
            event.prevent_default();
            let mut press = handler.borrow_mut();
            (*press)();
        });
        let _ = btn.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        for id in ["play-btn", "play-again-btn"] {
            let game = game.clone();
            on_click(document, id, move || game.borrow_mut().command(Command::Start));
        }

        {
            let game = game.clone();
            on_press(document, "left-btn", move || {
                game.borrow_mut().command(Command::MoveLeft)
            });
        }
        {
            let game = game.clone();
            on_press(document, "right-btn", move || {
                game.borrow_mut().command(Command::MoveRight)
            });
        }

        {
            let game = game.clone();
            on_click(document, "exit-btn", move || {
                let confirmed = web_sys::window()
                    .and_then(|w| w.confirm_with_message("Are you sure you want to exit?").ok())
                    .unwrap_or(false);
                if confirmed {
                    game.borrow_mut().command(Command::Exit);
                }
            });
        }

        on_click(document, "fullscreen-btn", toggle_fullscreen);

        {
            let game = game.clone();
            on_click(document, "sound-btn", move || game.borrow_mut().toggle_sound());
        }
        on_click(document, "music-btn", move || game.borrow_mut().toggle_music());
    }

    fn toggle_fullscreen() {
        let Some(document) = document() else { return };
        if document.fullscreen_element().is_some() {
            document.exit_fullscreen();
        } else if let Some(root) = document.document_element() {
            if let Err(e) = root.request_fullscreen() {
                log::warn!("Fullscreen refused: {:?}", e);
            }
        }
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let command = match event.key().as_str() {
                "ArrowLeft" | "a" | "A" => Command::MoveLeft,
                "ArrowRight" | "d" | "D" => Command::MoveRight,
                "ArrowDown" | "s" | "S" => Command::DropFast,
                _ => return,
            };
            event.prevent_default();
            game.borrow_mut().command(command);
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_auto_pause(document: &Document, game: Rc<RefCell<Game>>) {
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut g = game.borrow_mut();
            if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                if g.settings.pause_on_hide && g.state.is_playing() {
                    g.command(Command::Pause);
                    g.paused_by_visibility = true;
                    log::info!("Auto-paused (tab hidden)");
                }
            } else if g.paused_by_visibility {
                g.paused_by_visibility = false;
                // Don't count the hidden time as a frame
                g.last_time = 0.0;
                g.command(Command::Resume);
                log::info!("Resumed (tab visible)");
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
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
            g.render_board();
            g.update_hud();
        }

        request_animation_frame(game);
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
    log::info!("Number Blocks (native) starting...");
    log::info!("Run with `trunk serve` for the web version; playing a headless demo");

    // Usage: number-blocks [levels.json] [seed]
    let mut args = std::env::args().skip(1);
    let levels_json = args.next().and_then(|path| match std::fs::read_to_string(&path) {
        Ok(text) => Some(text),
        Err(e) => {
            log::warn!("Failed to read {}: {}", path, e);
            None
        }
    });
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);

    let tuning = number_blocks::Tuning::load_or_default(levels_json.as_deref());
    autoplay(tuning, seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Play a session with a simple bot: drop each piece next to a tile it can
/// combine with, else in the emptiest column
#[cfg(not(target_arch = "wasm32"))]
fn autoplay(tuning: number_blocks::Tuning, seed: u64) {
    use number_blocks::consts::{COLS, ROWS, SPAWN_COL};
    use number_blocks::sim::{Cell, Command, GameEvent, GamePhase, GameState, apply_command};

    const MAX_PIECES: u32 = 500;

    let mut state = GameState::new(tuning, seed);
    apply_command(&mut state, Command::Start);

    let mut pieces = 0;
    while state.phase == GamePhase::Playing && pieces < MAX_PIECES {
        let Some(piece) = state.piece else { break };

        // Topmost tile and free height per column
        let columns: Vec<(Option<u8>, usize)> = (0..COLS)
            .map(|col| {
                let top = (0..ROWS).find_map(|row| {
                    state.board.get(Cell::new(row, col)).filter(|&v| v > 0)
                });
                let free = (0..ROWS)
                    .take_while(|&row| state.board.is_vacant(Cell::new(row, col)))
                    .count();
                (top, free)
            })
            .collect();

        let combos = state.tuning.combos();
        let target = (0..COLS)
            .filter(|&col| columns[col].1 > 1)
            .find(|&col| columns[col].0.is_some_and(|top| combos.get(piece.value, top).is_some()))
            .or_else(|| (0..COLS).max_by_key(|&col| columns[col].1))
            .unwrap_or(SPAWN_COL);

        let shift = if target < SPAWN_COL {
            Command::MoveLeft
        } else {
            Command::MoveRight
        };
        for _ in 0..target.abs_diff(SPAWN_COL) {
            apply_command(&mut state, shift);
        }
        apply_command(&mut state, Command::DropFast);
        pieces += 1;

        for event in state.drain_events() {
            match event {
                GameEvent::MergeCompleted { value, score, .. } => {
                    log::info!("Made {} (score {})", value, score)
                }
                GameEvent::LevelChanged { level, fall_ms } => {
                    log::info!("Level {} ({} ms per row)", level, fall_ms)
                }
                GameEvent::GameOver { final_score } => {
                    log::info!("Game over with {} points", final_score)
                }
                other => log::debug!("{:?}", other),
            }
        }
    }

    println!("{}", state.board);
    println!(
        "Seed {}: {} pieces, level {}, score {}",
        seed, pieces, state.level, state.score
    );
}
