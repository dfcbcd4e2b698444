// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The shared coordination domain.
//!
//! Ingest, HTTP handlers and the feedback listener all reach the bridge state through one
//! [`Coordinator`]. Every accessor takes the same `parking_lot` mutex for the duration of
//! a single field update or copy, so state-machine transitions apply in arrival order and
//! readers always see a consistent snapshot. No accessor awaits while holding the lock.

use parking_lot::Mutex;
use thermobridge_core::{
    AlarmWindow, History, Reading, SamplingFrequency, StateMachine, SystemState, Transition,
};
use tracing::{debug, info, warn};

#[derive(Debug)]
struct ControlDomain {
    history: History,
    machine: StateMachine,
    latest_temperature: f64,
    window_tilt: i64,
}

/// Point-in-time copy of everything the query surface exposes, except the history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub temperature: f64,
    pub system_state: SystemState,
    pub alarm_latched: bool,
    pub sampling_frequency: SamplingFrequency,
    pub window_tilt: i64,
    pub history_len: usize,
}

#[derive(Debug)]
pub struct Coordinator {
    domain: Mutex<ControlDomain>,
}

impl Coordinator {
    pub fn new(window: AlarmWindow) -> Self {
        Self {
            domain: Mutex::new(ControlDomain {
                history: History::new(),
                machine: StateMachine::new(window),
                latest_temperature: 0.0,
                window_tilt: 0,
            }),
        }
    }

    /// Appends `reading` to the history and runs the state machine on it, atomically.
    pub fn record_reading(&self, reading: Reading) -> Transition {
        let transition = {
            let mut guard = self.domain.lock();
            let domain = &mut *guard;
            domain.latest_temperature = reading.value;
            domain.history.append(reading);
            domain.machine.on_reading(&reading, &domain.history)
        };

        if transition.alarm_triggered {
            warn!(temperature = reading.value, "alarm condition met, alarm latched");
        }
        if transition.changed() {
            info!(
                from = %transition.previous,
                to = %transition.current,
                frequency_ms = transition.frequency.millis(),
                "system state changed"
            );
        }

        transition
    }

    /// Clears the alarm latch. Returns whether it was set.
    pub fn reset_alarm(&self) -> bool {
        let was_latched = self.domain.lock().machine.reset_alarm();
        info!(was_latched, "alarm latch reset");
        was_latched
    }

    /// Empties the history; state, latch and frequency are untouched.
    ///
    /// Returns the number of readings removed.
    pub fn clear_history(&self) -> usize {
        let removed = {
            let mut domain = self.domain.lock();
            let removed = domain.history.len();
            domain.history.clear();
            removed
        };
        info!(removed, "temperature history cleared");
        removed
    }

    pub fn set_window_tilt(&self, tilt: i64) {
        self.domain.lock().window_tilt = tilt;
        debug!(tilt, "window tilt updated");
    }

    pub fn snapshot(&self) -> Snapshot {
        let domain = self.domain.lock();
        Snapshot {
            temperature: domain.latest_temperature,
            system_state: domain.machine.state(),
            alarm_latched: domain.machine.is_alarm_latched(),
            sampling_frequency: domain.machine.frequency(),
            window_tilt: domain.window_tilt,
            history_len: domain.history.len(),
        }
    }

    /// Copy of the history, oldest first.
    pub fn history(&self) -> Vec<Reading> {
        self.domain.lock().history.to_vec()
    }

    pub fn latest_temperature(&self) -> f64 {
        self.domain.lock().latest_temperature
    }

    pub fn system_state(&self) -> SystemState {
        self.domain.lock().machine.state()
    }

    pub fn sampling_frequency(&self) -> SamplingFrequency {
        self.domain.lock().machine.frequency()
    }

    pub fn is_alarm_latched(&self) -> bool {
        self.domain.lock().machine.is_alarm_latched()
    }

    pub fn window_tilt(&self) -> i64 {
        self.domain.lock().window_tilt
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(AlarmWindow::default())
    }
}
