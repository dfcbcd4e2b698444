// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::fmt;
use serde::{Deserialize, Serialize};

/// Lower bound of the HOT band, degrees Celsius.
pub const HOT_THRESHOLD: f64 = 25.0;

/// Lower bound of the TOO_HOT band, degrees Celsius.
pub const TOO_HOT_THRESHOLD: f64 = 30.0;

/// Overall system condition, serialized as `"NORMAL"`, `"HOT"`, `"TOO_HOT"` or `"ALARM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemState {
    #[default]
    Normal,
    Hot,
    TooHot,
    Alarm,
}

impl SystemState {
    /// Classifies a single reading by its value alone.
    ///
    /// Never yields [`SystemState::Alarm`]; that requires the sliding window.
    #[must_use]
    pub fn classify(value: f64) -> Self {
        if value < HOT_THRESHOLD {
            Self::Normal
        } else if value < TOO_HOT_THRESHOLD {
            Self::Hot
        } else {
            Self::TooHot
        }
    }

    /// The sensor reporting interval this state calls for.
    #[must_use]
    pub const fn sampling_frequency(self) -> SamplingFrequency {
        match self {
            Self::Normal => SamplingFrequency::NORMAL,
            Self::Hot => SamplingFrequency::HOT,
            Self::TooHot => SamplingFrequency::TOO_HOT,
            Self::Alarm => SamplingFrequency::ALARM,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Hot => "HOT",
            Self::TooHot => "TOO_HOT",
            Self::Alarm => "ALARM",
        }
    }
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interval, in milliseconds, at which the remote sensor is asked to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SamplingFrequency(u32);

impl SamplingFrequency {
    pub const NORMAL: Self = Self(5_000);
    pub const HOT: Self = Self(2_000);
    pub const TOO_HOT: Self = Self(1_000);
    pub const ALARM: Self = Self(500);

    #[must_use]
    pub const fn from_millis(millis: u32) -> Self {
        Self(millis)
    }

    #[must_use]
    pub const fn millis(self) -> u32 {
        self.0
    }
}

impl Default for SamplingFrequency {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<SystemState> for SamplingFrequency {
    fn from(state: SystemState) -> Self {
        state.sampling_frequency()
    }
}

/// Formats as the bare millisecond count, which is the outbound messaging payload.
impl fmt::Display for SamplingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
