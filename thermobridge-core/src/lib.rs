// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Pure state evaluation for the thermobridge.
//!
//! Nothing in this crate performs I/O or locks: the history buffer, the sliding-window
//! alarm check and the latched state machine are plain values that the coordination
//! layer in `thermobridge-exec` owns behind a single mutex.
pub mod alarm_window;
pub mod clock;
pub mod command;
pub mod history;
pub mod reading;
pub mod state_machine;
pub mod system_state;

pub use self::alarm_window::{alarm_condition_met, AlarmWindow};
pub use self::clock::{Clock, SystemClock};
pub use self::command::{ActuatorCommand, ControlCommand, Feedback, PROTOCOL_VERSION};
pub use self::history::{History, HISTORY_CAPACITY};
pub use self::reading::{parse_celsius, Reading};
pub use self::state_machine::{StateMachine, Transition};
pub use self::system_state::{SamplingFrequency, SystemState};
pub use thermobridge_error::{BridgeError, Result};
