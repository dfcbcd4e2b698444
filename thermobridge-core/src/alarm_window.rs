// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Sliding-window alarm detection.
//!
//! The alarm condition asks whether the temperature has been at or above a threshold for
//! the whole trailing window. An empty window is treated as "no evidence" and never raises
//! the alarm: at least one reading (or [`AlarmWindow::min_samples`] readings) must be
//! present and every one of them must qualify.

use crate::history::History;

/// Default trailing window length in milliseconds.
pub const DEFAULT_WINDOW_MS: i64 = 3_000;

/// Default alarm threshold in degrees Celsius.
pub const DEFAULT_THRESHOLD: f64 = 30.0;

/// Parameters of the sustained-temperature alarm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlarmWindow {
    /// Length of the trailing window ending at "now".
    pub window_ms: i64,
    /// Every reading in the window must be at or above this value.
    pub threshold: f64,
    /// Readings required in the window before the alarm may fire. Values below 1 are
    /// treated as 1.
    pub min_samples: usize,
}

impl AlarmWindow {
    #[must_use]
    pub const fn new(window_ms: i64, threshold: f64) -> Self {
        Self {
            window_ms,
            threshold,
            min_samples: 1,
        }
    }

    #[must_use]
    pub const fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Evaluates the alarm condition against `history` at time `now`.
    #[must_use]
    pub fn is_met(&self, history: &History, now: i64) -> bool {
        let mut samples = 0usize;
        for reading in history.in_window(now, self.window_ms) {
            if reading.value < self.threshold {
                return false;
            }
            samples += 1;
        }
        samples >= self.min_samples.max(1)
    }
}

impl Default for AlarmWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MS, DEFAULT_THRESHOLD)
    }
}

/// True iff the trailing window is non-empty and every reading in it is `>= threshold`.
#[must_use]
pub fn alarm_condition_met(history: &History, now: i64, window_ms: i64, threshold: f64) -> bool {
    AlarmWindow::new(window_ms, threshold).is_met(history, now)
}
