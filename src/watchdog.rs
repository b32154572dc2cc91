//! Integrity watchdog
//!
//! Once per interval the watchdog compares the three copies of the score:
//! - in memory ([`ProtectedScore`], authoritative)
//! - on screen (text and hidden attribute)
//! - in storage (the persisted token)
//!
//! The display is always forced back to the in-memory value. The persisted
//! value only wins when it disagrees with memory and the previous tick is at
//! least a grace window old, so an update the page has not saved yet is
//! never rolled back by the next tick.

use crate::config::WatchdogConfig;
use crate::display::ScoreDisplay;
use crate::persistence::ScoreStore;
use crate::platform::{Clock, KeyValueStore};
use crate::score::ProtectedScore;

/// Lifecycle of the watchdog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    /// Created, no tick yet
    Inactive,
    /// Ticking
    Running,
    /// Stopped by its owner; ticks are ignored
    Stopped,
}

/// What a single tick changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Display text or attribute was rewritten
    pub display_corrected: bool,
    /// In-memory score was replaced by this persisted score
    pub score_restored: Option<u64>,
}

impl TickReport {
    pub fn is_clean(&self) -> bool {
        !self.display_corrected && self.score_restored.is_none()
    }
}

/// Score and time recorded at the end of the previous tick
#[derive(Debug, Clone, Copy, PartialEq)]
struct Reconciliation {
    /// Diagnostics only: logged when the score moved between ticks
    score: u64,
    /// Basis for the grace window
    at_ms: f64,
}

pub struct IntegrityWatchdog<D, S, C> {
    score: ProtectedScore,
    display: D,
    store: ScoreStore<S>,
    clock: C,
    config: WatchdogConfig,
    state: WatchdogState,
    last: Option<Reconciliation>,
}

impl<D, S, C> IntegrityWatchdog<D, S, C> {
    pub fn state(&self) -> WatchdogState {
        self.state
    }

    pub fn stop(&mut self) {
        if self.state != WatchdogState::Stopped {
            self.state = WatchdogState::Stopped;
            log::info!("Score watchdog stopped");
        }
    }
}

impl<D: ScoreDisplay, S: KeyValueStore, C: Clock> IntegrityWatchdog<D, S, C> {
    pub fn new(
        score: ProtectedScore,
        display: D,
        store: ScoreStore<S>,
        clock: C,
        config: WatchdogConfig,
    ) -> Self {
        Self {
            score,
            display,
            store,
            clock,
            config,
            state: WatchdogState::Inactive,
            last: None,
        }
    }

    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    pub fn score(&self) -> &ProtectedScore {
        &self.score
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn store(&self) -> &ScoreStore<S> {
        &self.store
    }

    /// Start the grace-window clock. No-op unless inactive.
    pub fn arm(&mut self) {
        if self.state != WatchdogState::Inactive {
            return;
        }
        self.last = Some(Reconciliation {
            score: self.score.get(),
            at_ms: self.clock.now_ms(),
        });
        self.state = WatchdogState::Running;
        log::info!(
            "Score watchdog armed (every {} ms, grace {} ms)",
            self.config.interval_ms,
            self.config.grace_window_ms
        );
    }

    /// Run one reconciliation pass
    pub fn tick(&mut self) -> TickReport {
        match self.state {
            WatchdogState::Stopped => return TickReport::default(),
            WatchdogState::Inactive => self.arm(),
            WatchdogState::Running => {}
        }

        let mut report = TickReport {
            display_corrected: self.correct_display(),
            score_restored: None,
        };

        let now = self.clock.now_ms();
        if let Some(record) = self.store.load() {
            let current = self.score.get();
            if record.score != current && self.grace_elapsed(now) {
                log::warn!(
                    "Score {} disagrees with persisted {}; restoring persisted value",
                    current,
                    record.score
                );
                self.score.set(record.score);
                report.display_corrected |= self.correct_display();
                report.score_restored = Some(record.score);
            }
        }

        if let Some(last) = self.last {
            let current = self.score.get();
            if last.score != current {
                log::debug!("Score moved {} -> {} since last tick", last.score, current);
            }
        }
        self.last = Some(Reconciliation {
            score: self.score.get(),
            at_ms: now,
        });

        report
    }

    fn grace_elapsed(&self, now_ms: f64) -> bool {
        self.last
            .map(|last| now_ms - last.at_ms >= self.config.grace_window_ms)
            .unwrap_or(false)
    }

    /// Force both display representations to the in-memory score.
    /// Returns whether anything had drifted.
    fn correct_display(&self) -> bool {
        let rendered = self.score.rendered();
        if self.display.shows(&rendered) {
            return false;
        }
        log::warn!(
            "Score display drift (text {:?}, value {:?}, expected {}); correcting",
            self.display.text(),
            self.display.value_attribute(),
            rendered
        );
        self.display.render(&rendered);
        true
    }
}

#[cfg(target_arch = "wasm32")]
pub use scheduled::WatchdogHandle;

#[cfg(target_arch = "wasm32")]
mod scheduled {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    use super::*;

    /// Running watchdog driven by `window.setInterval`.
    /// Dropping the handle stops it.
    pub struct WatchdogHandle<D, S, C> {
        watchdog: Rc<RefCell<IntegrityWatchdog<D, S, C>>>,
        interval_id: Option<i32>,
        _tick: Closure<dyn FnMut()>,
    }

    impl<D, S, C> IntegrityWatchdog<D, S, C>
    where
        D: ScoreDisplay + 'static,
        S: KeyValueStore + 'static,
        C: Clock + 'static,
    {
        /// Arm and schedule the watchdog on the browser timer
        pub fn start(mut self) -> Result<WatchdogHandle<D, S, C>, JsValue> {
            let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
            let interval = i32::try_from(self.config.interval_ms).unwrap_or(i32::MAX);

            self.arm();
            let watchdog = Rc::new(RefCell::new(self));

            let tick = {
                let watchdog = watchdog.clone();
                Closure::<dyn FnMut()>::new(move || {
                    // Skip rather than panic if something re-entered
                    if let Ok(mut w) = watchdog.try_borrow_mut() {
                        w.tick();
                    }
                })
            };
            let interval_id = window.set_interval_with_callback_and_timeout_and_arguments_0(
                tick.as_ref().unchecked_ref(),
                interval,
            )?;

            Ok(WatchdogHandle {
                watchdog,
                interval_id: Some(interval_id),
                _tick: tick,
            })
        }
    }

    impl<D, S, C> WatchdogHandle<D, S, C>
    where
        D: ScoreDisplay,
        S: KeyValueStore,
        C: Clock,
    {
        pub fn is_running(&self) -> bool {
            self.interval_id.is_some()
        }

        /// Run a tick immediately, outside the timer
        pub fn tick_now(&self) -> TickReport {
            self.watchdog
                .try_borrow_mut()
                .map(|mut w| w.tick())
                .unwrap_or_default()
        }

        /// Cancel the timer. Safe to call more than once.
        pub fn stop(&mut self) {
            let Some(id) = self.interval_id.take() else {
                return;
            };
            if let Some(window) = web_sys::window() {
                window.clear_interval_with_handle(id);
            }
            if let Ok(mut w) = self.watchdog.try_borrow_mut() {
                w.stop();
            }
        }
    }

    impl<D, S, C> Drop for WatchdogHandle<D, S, C> {
        fn drop(&mut self) {
            if let Some(id) = self.interval_id.take() {
                if let Some(window) = web_sys::window() {
                    window.clear_interval_with_handle(id);
                }
                if let Ok(mut w) = self.watchdog.try_borrow_mut() {
                    w.stop();
                }
            }
        }
    }
}
