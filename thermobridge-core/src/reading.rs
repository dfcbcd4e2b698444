// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use serde::{Deserialize, Serialize};
use thermobridge_error::{BridgeError, Result};

/// A single temperature sample.
///
/// The timestamp is wall-clock time in milliseconds since the UNIX epoch, which is also
/// what the history endpoint reports. Serializes as `{"timestamp": .., "temperature": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: i64,
    #[serde(rename = "temperature")]
    pub value: f64,
}

impl Reading {
    /// Creates a reading taken at `timestamp` milliseconds.
    #[must_use]
    pub const fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Milliseconds between this reading and `now`.
    ///
    /// Negative when the reading is stamped after `now`.
    #[must_use]
    pub const fn age(&self, now: i64) -> i64 {
        now - self.timestamp
    }
}

/// Parses a messaging payload into degrees Celsius.
///
/// The payload is UTF-8 decimal text; surrounding whitespace is ignored. NaN and the
/// infinities parse as `f64` but are not temperatures, so they are rejected too.
///
/// # Errors
/// Returns [`BridgeError::InvalidReading`] when the payload is not valid UTF-8 or not a
/// finite decimal number.
pub fn parse_celsius(payload: &[u8]) -> Result<f64> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| BridgeError::invalid_reading(String::from_utf8_lossy(payload)))?;

    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(BridgeError::invalid_reading(text)),
    }
}
