//! Simulation clock.
//!
//! One variable-length simulation tick advances the clock; every time-based
//! gate in the combat core (attack cadence, hit invulnerability, routine
//! wake-ups) reads `now` from here rather than from the wall clock.

use serde::{Deserialize, Serialize};

/// Monotonic simulation time in seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimClock {
    /// Elapsed simulation seconds.
    now: f64,
    /// Length of the most recent tick.
    last_dt: f32,
    /// Number of ticks advanced so far.
    frame: u64,
}

impl SimClock {
    /// Create a clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulation time in seconds.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Length of the most recent tick in seconds.
    #[must_use]
    pub fn last_dt(&self) -> f32 {
        self.last_dt
    }

    /// Number of ticks advanced so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advance by `dt` seconds. Negative deltas are treated as zero.
    pub fn advance(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.now += f64::from(dt);
        self.last_dt = dt;
        self.frame += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advances() {
        let mut clock = SimClock::new();
        clock.advance(0.25);
        clock.advance(0.25);
        assert!((clock.now() - 0.5).abs() < f64::EPSILON);
        assert_eq!(clock.frame(), 2);
        assert!((clock.last_dt() - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_clock_ignores_negative_dt() {
        let mut clock = SimClock::new();
        clock.advance(-1.0);
        assert!(clock.now().abs() < f64::EPSILON);
    }
}
