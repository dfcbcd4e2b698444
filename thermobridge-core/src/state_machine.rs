// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Latched temperature state machine.
//!
//! Each reading either leaves a latched alarm untouched, raises the alarm when the
//! sliding window is satisfied, or classifies the reading by value. The alarm latch is
//! sticky: once set, readings of any value leave the machine in
//! [`SystemState::Alarm`] until [`StateMachine::reset_alarm`] clears it.
//!
//! The window check and the per-reading bands can disagree: a single reading of 31.0
//! whose window also holds a cooler sample is TOO_HOT, not ALARM.

use crate::alarm_window::AlarmWindow;
use crate::history::History;
use crate::reading::Reading;
use crate::system_state::{SamplingFrequency, SystemState};

/// Outcome of feeding one reading to the [`StateMachine`].
///
/// Side effects (serial commands, frequency publication, logging) are driven from this
/// value by the caller, after the state lock has been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub previous: SystemState,
    pub current: SystemState,
    pub frequency: SamplingFrequency,
    /// The alarm fired on this reading; an alarm-trigger command is due.
    pub alarm_triggered: bool,
    /// The latch was already set, so the reading was not evaluated.
    pub latched: bool,
}

impl Transition {
    /// Whether the state differs from the one observed before the reading.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

#[derive(Debug, Clone)]
pub struct StateMachine {
    state: SystemState,
    alarm_latched: bool,
    frequency: SamplingFrequency,
    window: AlarmWindow,
}

impl StateMachine {
    /// Creates a machine in NORMAL, unlatched, at 5000 ms.
    #[must_use]
    pub fn new(window: AlarmWindow) -> Self {
        Self {
            state: SystemState::Normal,
            alarm_latched: false,
            frequency: SamplingFrequency::NORMAL,
            window,
        }
    }

    /// Evaluates `reading`, which must already be appended to `history`.
    ///
    /// The reading's own timestamp is "now" for the window check.
    pub fn on_reading(&mut self, reading: &Reading, history: &History) -> Transition {
        let previous = self.state;

        if self.alarm_latched {
            self.enter(SystemState::Alarm);
            return Transition {
                previous,
                current: self.state,
                frequency: self.frequency,
                alarm_triggered: false,
                latched: true,
            };
        }

        let alarm_triggered = self.window.is_met(history, reading.timestamp);
        if alarm_triggered {
            self.alarm_latched = true;
            self.enter(SystemState::Alarm);
        } else {
            self.enter(SystemState::classify(reading.value));
        }

        Transition {
            previous,
            current: self.state,
            frequency: self.frequency,
            alarm_triggered,
            latched: false,
        }
    }

    /// Clears the alarm latch.
    ///
    /// The state itself is left as is; the next reading drives the next evaluation.
    /// Returns whether the latch was set.
    pub fn reset_alarm(&mut self) -> bool {
        core::mem::replace(&mut self.alarm_latched, false)
    }

    fn enter(&mut self, state: SystemState) {
        self.state = state;
        self.frequency = state.sampling_frequency();
    }

    #[must_use]
    pub const fn state(&self) -> SystemState {
        self.state
    }

    #[must_use]
    pub const fn is_alarm_latched(&self) -> bool {
        self.alarm_latched
    }

    #[must_use]
    pub const fn frequency(&self) -> SamplingFrequency {
        self.frequency
    }

    #[must_use]
    pub const fn window(&self) -> &AlarmWindow {
        &self.window
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(AlarmWindow::default())
    }
}
