//! Browser adapter
//!
//! The scene script owns rendering and physics. It forwards collisions and
//! button presses here and drains `GameEvent`s as JSON once per frame.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::game::Game;
use crate::persistence::{ClassStore, LevelUnlocks, LocalStore, random_class_code};
use crate::platform::SystemClock;
use crate::question_bank::fetch_level;
use crate::results::{format_relative, summarize_class};
use crate::session::{Session, SessionBoot, SessionContext};
use crate::settings::ClassSettings;
use crate::sim::AttemptInput;

use super::Clock;

/// Global the level select page leaves behind for the game page
const BOOT_GLOBAL: &str = "BIOQUEST_SESSION_BOOT";

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(js_error)
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialised".into());
    }
}

/// Read the boot record from `window.BIOQUEST_SESSION_BOOT`
fn read_boot() -> Result<SessionBoot, JsValue> {
    let window = web_sys::window().ok_or_else(|| js_error("no window"))?;
    let raw = js_sys::Reflect::get(&window, &JsValue::from_str(BOOT_GLOBAL))?;
    if raw.is_undefined() || raw.is_null() {
        return Ok(SessionBoot::default());
    }
    let json: String = js_sys::JSON::stringify(&raw)?.into();
    serde_json::from_str(&json).map_err(js_error)
}

/// One student's game session in the page
#[wasm_bindgen]
pub struct WebGame {
    game: Rc<RefCell<Game>>,
    base_url: String,
}

#[wasm_bindgen]
impl WebGame {
    /// Validate the boot record and open storage. Question banks are fetched
    /// from `base_url`.
    pub fn boot(base_url: String) -> Result<WebGame, JsValue> {
        let session = Session::from_boot(&read_boot()?).map_err(js_error)?;
        let storage = LocalStore::open().map_err(js_error)?;
        let class_store = ClassStore::new(storage.clone());
        let class_settings = class_store.load_class_settings(&session.class_code);
        let unlocks = LevelUnlocks::new(storage, &session.class_code, &session.student_id);

        log::info!(
            "Session for {} in class {} ({})",
            session.student_id,
            session.class_code,
            session.mode.as_str()
        );

        let ctx = SessionContext::new(
            session,
            Box::new(class_store),
            Box::new(unlocks),
            Box::new(SystemClock),
        );
        Ok(WebGame {
            game: Rc::new(RefCell::new(Game::new(ctx, class_settings))),
            base_url,
        })
    }

    /// Level the session boots into
    pub fn boot_level(&self) -> String {
        self.game.borrow().context().session.level_id.clone()
    }

    /// Fetch a level and start attempt 1. Resolves once the level runs.
    pub fn start_level(&self, level_id: String) -> js_sys::Promise {
        let game = Rc::clone(&self.game);
        let base_url = self.base_url.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            let level = fetch_level(&base_url, &level_id).await.map_err(js_error)?;
            game.borrow_mut().start_level(level);
            Ok(JsValue::TRUE)
        })
    }

    /// Fetch and start the successor level. Resolves to `false` when no next
    /// level is offered.
    pub fn next_level(&self) -> js_sys::Promise {
        let game = Rc::clone(&self.game);
        let base_url = self.base_url.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            let Some(next) = game.borrow().next_level_id() else {
                return Ok(JsValue::FALSE);
            };
            let level = fetch_level(&base_url, next).await.map_err(js_error)?;
            game.borrow_mut().start_level(level);
            Ok(JsValue::TRUE)
        })
    }

    pub fn retry(&self) -> bool {
        self.game.borrow_mut().retry()
    }

    pub fn return_to_menu(&self) {
        self.game.borrow_mut().return_to_menu();
    }

    pub fn trigger_block(&self, block_id: String, from_below: bool) {
        self.send(AttemptInput::TriggerBlock {
            block_id,
            from_below,
        });
    }

    pub fn submit_answer(&self, choice: usize) {
        self.send(AttemptInput::SubmitAnswer { choice });
    }

    pub fn acknowledge_answer(&self) {
        self.send(AttemptInput::AcknowledgeAnswer);
    }

    pub fn reach_goal(&self) {
        self.send(AttemptInput::ReachGoal);
    }

    pub fn take_damage(&self) {
        self.send(AttemptInput::TakeDamage);
    }

    pub fn collect_coin(&self) {
        self.send(AttemptInput::CollectCoin);
    }

    pub fn stomp_enemy(&self) {
        self.send(AttemptInput::StompEnemy);
    }

    /// Advance the frame clock
    pub fn tick(&self, dt_ms: u32) {
        self.game.borrow_mut().tick(&[], dt_ms);
    }

    /// Whether the scene should run physics this frame
    pub fn simulation_running(&self) -> bool {
        self.game
            .borrow()
            .attempt()
            .is_some_and(|a| a.is_simulation_running())
    }

    /// Pending events as a JSON array
    pub fn drain_events(&self) -> Result<String, JsValue> {
        to_json(&self.game.borrow_mut().drain_events())
    }

    /// HUD snapshot as JSON, `null` at the menu
    pub fn hud(&self) -> Result<String, JsValue> {
        to_json(&self.game.borrow().attempt().map(|a| a.hud()))
    }

    fn send(&self, input: AttemptInput) {
        self.game.borrow_mut().tick(std::slice::from_ref(&input), 0);
    }
}

/// Teacher dashboard over the same LocalStorage records
#[wasm_bindgen]
pub struct TeacherPanel {
    store: ClassStore<LocalStore>,
}

#[wasm_bindgen]
impl TeacherPanel {
    pub fn open() -> Result<TeacherPanel, JsValue> {
        Ok(TeacherPanel {
            store: ClassStore::new(LocalStore::open().map_err(js_error)?),
        })
    }

    /// Create a class with default settings and return its code
    pub fn create_class(&self) -> Result<String, JsValue> {
        let code = random_class_code(&mut rand::rng());
        self.store
            .save_class_settings(&ClassSettings::for_class(&code))
            .map_err(js_error)?;
        log::info!("Created class {}", code);
        Ok(code)
    }

    /// Class settings as JSON
    pub fn class_settings(&self, class_code: &str) -> Result<String, JsValue> {
        to_json(&self.store.load_class_settings(class_code))
    }

    /// Replace class settings from JSON
    pub fn save_class_settings(&self, json: &str) -> Result<(), JsValue> {
        let settings: ClassSettings = serde_json::from_str(json).map_err(js_error)?;
        self.store.save_class_settings(&settings).map_err(js_error)
    }

    /// Per-student rows as JSON, each with a relative "last played" label
    pub fn summary(&self, class_code: &str) -> Result<String, JsValue> {
        let now_ms = SystemClock.now_ms();
        let rows: Vec<serde_json::Value> = summarize_class(&self.store.read_all_results(class_code))
            .into_iter()
            .map(|row| {
                let when = row
                    .last
                    .as_ref()
                    .map(|r| format_relative(&r.at_iso, now_ms))
                    .unwrap_or_else(|| "N/A".to_string());
                serde_json::json!({ "row": row, "lastPlayed": when })
            })
            .collect();
        to_json(&rows)
    }

    pub fn clear_results(&self, class_code: &str) -> Result<(), JsValue> {
        self.store.clear_results(class_code).map_err(js_error)
    }
}
