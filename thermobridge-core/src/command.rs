// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Serial actuator protocol and inbound control commands.
//!
//! The serial line carries '\n'-terminated ASCII. Outbound lines are either a forwarded
//! temperature or one of the integer codes of [`ActuatorCommand`]. Codes start at 1001 so
//! the actuator can tell them apart from any plausible temperature.
//!
//! | code | command        |
//! |------|----------------|
//! | 1001 | alarm trigger  |
//! | 1002 | reset          |
//! | 1003 | auto mode      |
//! | 1004 | manual mode    |
//!
//! Inbound lines that parse as an integer are tilt feedback, anything else is
//! diagnostic text.

use core::fmt;
use core::str::FromStr;
use thermobridge_error::BridgeError;

/// Version of the actuator command table. Bump when a code changes meaning.
pub const PROTOCOL_VERSION: u16 = 1;

/// Control codes understood by the actuator firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ActuatorCommand {
    AlarmTrigger = 1001,
    Reset = 1002,
    AutoMode = 1003,
    ManualMode = 1004,
}

impl ActuatorCommand {
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }

    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            1001 => Some(Self::AlarmTrigger),
            1002 => Some(Self::Reset),
            1003 => Some(Self::AutoMode),
            1004 => Some(Self::ManualMode),
            _ => None,
        }
    }
}

/// Formats as the wire code, without the line terminator.
impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Operator commands accepted by the HTTP command endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlCommand {
    ResetAlarm,
    AutoMode,
    ManualMode,
}

impl ControlCommand {
    /// The actuator code this command is dispatched as.
    #[must_use]
    pub const fn actuator_command(self) -> ActuatorCommand {
        match self {
            Self::ResetAlarm => ActuatorCommand::Reset,
            Self::AutoMode => ActuatorCommand::AutoMode,
            Self::ManualMode => ActuatorCommand::ManualMode,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ResetAlarm => "RESET_ALARM",
            Self::AutoMode => "AUTO_MODE",
            Self::ManualMode => "MANUAL_MODE",
        }
    }
}

impl FromStr for ControlCommand {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RESET_ALARM" => Ok(Self::ResetAlarm),
            "AUTO_MODE" => Ok(Self::AutoMode),
            "MANUAL_MODE" => Ok(Self::ManualMode),
            other => Err(BridgeError::unknown_command(other)),
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inbound line from the actuator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Integer window tilt reported by the actuator.
    Tilt(i64),
    /// Free-form diagnostic text.
    Diagnostic(String),
}

impl Feedback {
    /// Classifies a line; the terminator and surrounding whitespace are ignored.
    #[must_use]
    pub fn parse_line(line: &str) -> Self {
        let trimmed = line.trim();
        trimmed
            .parse::<i64>()
            .map_or_else(|_| Self::Diagnostic(trimmed.to_owned()), Self::Tilt)
    }
}
