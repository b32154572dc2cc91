//! The protected score
//!
//! One shared cell instead of a loose global. Gameplay code and the watchdog
//! each hold a clone; every clone reads and writes the same value.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct ProtectedScore {
    value: Rc<Cell<u64>>,
}

impl ProtectedScore {
    pub fn new(initial: u64) -> Self {
        Self {
            value: Rc::new(Cell::new(initial)),
        }
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.value.get()
    }

    #[inline]
    pub fn set(&self, score: u64) {
        self.value.set(score);
    }

    /// Add points (saturating), returning the new score
    pub fn add(&self, points: u64) -> u64 {
        let score = self.get().saturating_add(points);
        self.set(score);
        score
    }

    /// Base-10 form used by the display
    pub fn rendered(&self) -> String {
        self.get().to_string()
    }
}

/// Largest integer a JS number holds exactly (`Number.MAX_SAFE_INTEGER`)
pub const MAX_SAFE_SCORE: u64 = (1 << 53) - 1;

/// Accept a JS number as a score: finite, non-negative, whole and exact
pub fn score_from_js(value: f64) -> Option<u64> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= MAX_SAFE_SCORE as f64 {
        Some(value as u64)
    } else {
        None
    }
}

/// Scores above [`MAX_SAFE_SCORE`] lose precision on the way out
pub fn score_to_js(score: u64) -> f64 {
    score as f64
}

impl fmt::Display for ProtectedScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}
