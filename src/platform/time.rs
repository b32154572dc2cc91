//! Millisecond clocks

use std::cell::Cell;
use std::rc::Rc;

/// Milliseconds from an arbitrary fixed origin. Only differences are meaningful.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Monotonic time: `performance.now()` on web, `Instant` on native.
/// Changing the system date never moves it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

#[cfg(not(target_arch = "wasm32"))]
static ORIGIN: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();

impl Clock for MonotonicClock {
    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> f64 {
        // Workers without `performance` fall back to the wall clock
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> f64 {
        ORIGIN
            .get_or_init(std::time::Instant::now)
            .elapsed()
            .as_secs_f64()
            * 1000.0
    }
}

/// Hand-advanced clock. Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(1000.0);
        let other = clock.clone();
        clock.advance(250.0);
        assert_eq!(other.now_ms(), 1250.0);
        other.set(0.0);
        assert_eq!(clock.now_ms(), 0.0);
    }

    #[test]
    fn test_monotonic_clock_never_goes_back() {
        let clock = MonotonicClock;
        let mut previous = clock.now_ms();
        for _ in 0..1000 {
            let now = clock.now_ms();
            assert!(now >= previous);
            previous = now;
        }
    }

    #[test]
    fn test_monotonic_clock_is_not_wall_time() {
        // Measured from process start, so nowhere near a Unix timestamp
        // (2020-01-01T00:00:00Z)
        assert!(MonotonicClock.now_ms() < 1_577_836_800_000.0);
    }
}
