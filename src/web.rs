//! JavaScript surface
//!
//! The puzzle pages never touch the score directly. They construct one
//! `ScoreGuard` bound to the score element and go through it for every
//! legitimate change.
//!
//! ```js
//! const guard = new ScoreGuard("score");
//! guard.addPoints(10);
//! guard.save();
//! ```
//!
//! Scores cross the boundary as plain JS numbers. Anything that is not a
//! whole number in `0..=Number.MAX_SAFE_INTEGER` is refused with an error.

use wasm_bindgen::prelude::*;

use crate::config::GuardConfig;
use crate::display::{DomScoreDisplay, ScoreDisplay};
use crate::logging;
use crate::persistence::ScoreStore;
use crate::platform::{LocalStorage, MemoryStorage, MonotonicClock};
use crate::score::{ProtectedScore, score_from_js, score_to_js};
use crate::watchdog::{IntegrityWatchdog, WatchdogHandle};

/// Storage the guard ended up with
enum Backend {
    Local(ScoreStore<LocalStorage>),
    /// localStorage disabled; the score lives for this page only
    Memory(ScoreStore<MemoryStorage>),
}

enum Handle {
    Local(WatchdogHandle<DomScoreDisplay, LocalStorage, MonotonicClock>),
    Memory(WatchdogHandle<DomScoreDisplay, MemoryStorage, MonotonicClock>),
}

/// Runs when the module is instantiated
#[wasm_bindgen(start)]
pub fn start() {
    logging::init();
    log::info!("Score guard loaded");
}

fn js_score(value: f64) -> Result<u64, JsValue> {
    score_from_js(value)
        .ok_or_else(|| JsValue::from_str(&format!("not a valid score: {}", value)))
}

#[wasm_bindgen]
pub struct ScoreGuard {
    score: ProtectedScore,
    display: DomScoreDisplay,
    backend: Backend,
    handle: Option<Handle>,
}

#[wasm_bindgen]
impl ScoreGuard {
    /// Bind to the element with `element_id` and start the watchdog.
    ///
    /// `config_json` overrides the page config; when absent the
    /// `#score-guard-config` element (or the defaults) is used.
    #[wasm_bindgen(constructor)]
    pub fn new(element_id: &str, config_json: Option<String>) -> Result<ScoreGuard, JsValue> {
        logging::init();

        let config = match config_json {
            Some(json) => GuardConfig::from_json(&json)
                .map_err(|e| JsValue::from_str(&format!("bad guard config: {}", e)))?,
            None => GuardConfig::load(),
        };

        let display = DomScoreDisplay::by_id(element_id, config.value_attribute.as_str())
            .ok_or_else(|| JsValue::from_str(&format!("no element #{}", element_id)))?;
        let codec = config.codec();

        let backend = match LocalStorage::open() {
            Ok(storage) => Backend::Local(ScoreStore::with_key(
                storage,
                codec,
                config.storage_key.as_str(),
            )),
            Err(e) => {
                log::warn!("{}; score will not survive a reload", e);
                Backend::Memory(ScoreStore::with_key(
                    MemoryStorage::new(),
                    codec,
                    config.storage_key.as_str(),
                ))
            }
        };

        // Resume from the last saved score, if it verifies
        let initial = match &backend {
            Backend::Local(store) => store.load(),
            Backend::Memory(store) => store.load(),
        }
        .map(|record| record.score)
        .unwrap_or(0);
        let score = ProtectedScore::new(initial);
        display.render(&score.rendered());

        let handle = match &backend {
            Backend::Local(store) => Handle::Local(
                IntegrityWatchdog::new(
                    score.clone(),
                    display.clone(),
                    store.clone(),
                    MonotonicClock,
                    config.watchdog,
                )
                .start()?,
            ),
            Backend::Memory(store) => Handle::Memory(
                IntegrityWatchdog::new(
                    score.clone(),
                    display.clone(),
                    store.clone(),
                    MonotonicClock,
                    config.watchdog,
                )
                .start()?,
            ),
        };

        log::info!("Score guard ready on #{} (score {})", element_id, initial);
        Ok(ScoreGuard {
            score,
            display,
            backend,
            handle: Some(handle),
        })
    }

    pub fn score(&self) -> f64 {
        score_to_js(self.score.get())
    }

    #[wasm_bindgen(js_name = setScore)]
    pub fn set_score(&self, score: f64) -> Result<(), JsValue> {
        self.apply(js_score(score)?);
        Ok(())
    }

    /// Returns the new score
    #[wasm_bindgen(js_name = addPoints)]
    pub fn add_points(&self, points: f64) -> Result<f64, JsValue> {
        let score = self.score.add(js_score(points)?);
        self.display.render(&self.score.rendered());
        Ok(score_to_js(score))
    }

    /// Persist the current score
    pub fn save(&self) {
        let score = self.score.get();
        match &self.backend {
            Backend::Local(store) => store.save(score),
            Backend::Memory(store) => store.save(score),
        }
    }

    /// Forget the persisted score and start again from zero
    pub fn reset(&self) {
        match &self.backend {
            Backend::Local(store) => store.clear(),
            Backend::Memory(store) => store.clear(),
        }
        self.apply(0);
    }

    /// Stop the watchdog. Call before tearing the page down.
    pub fn stop(&mut self) {
        match self.handle.take() {
            Some(Handle::Local(mut h)) => h.stop(),
            Some(Handle::Memory(mut h)) => h.stop(),
            None => {}
        }
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl ScoreGuard {
    /// Legitimate change: memory and display move together
    fn apply(&self, score: u64) {
        self.score.set(score);
        self.display.render(&self.score.rendered());
    }
}
