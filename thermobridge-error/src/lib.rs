// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions)]
//! Error types for the thermobridge sensor/actuator bridge
//!
//! Every failure the bridge can observe is one of four kinds: a payload or request that
//! does not parse, an I/O failure on the serial line, a command outside the actuator
//! protocol, or a messaging transport failure. None of them is fatal to the process; the
//! classification helpers let callers decide whether to surface, retry or just log.
//!
//! # Examples
//!
//! ```
//! use thermobridge_error::{BridgeError, Result};
//!
//! fn parse_celsius(payload: &str) -> Result<f64> {
//!     payload
//!         .trim()
//!         .parse()
//!         .map_err(|_| BridgeError::invalid_reading(payload))
//! }
//!
//! assert!(parse_celsius("21.5").is_ok());
//! assert!(parse_celsius("warm").is_err());
//! ```

use std::time::Duration;

/// Root error type for all bridge operations
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A temperature payload could not be parsed as a finite number
    #[error("Invalid temperature payload: {payload:?}")]
    InvalidReading {
        /// The raw payload, lossily decoded
        payload: String,
    },

    /// A control command outside the supported set
    ///
    /// Raised instead of silently ignoring the request.
    #[error("Unknown command: {command:?}")]
    UnknownCommand {
        /// The command text as received
        command: String,
    },

    /// A request body was missing, malformed or lacked a required field
    #[error("Invalid request: {reason}")]
    InvalidRequest {
        /// What was wrong with the request
        reason: String,
    },

    /// The serial channel is closed or was never opened
    #[error("Serial channel unavailable")]
    SerialUnavailable,

    /// Reading from or writing to the serial channel failed
    #[error("Serial I/O failed while {context}: {source}")]
    SerialIo {
        /// The operation in progress
        context: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An operation exceeded its time budget
    #[error("Operation timed out after {duration:?}: {operation}")]
    Timeout {
        /// The operation that timed out
        operation: String,
        /// How long we waited
        duration: Duration,
    },

    /// Publishing or subscribing on the messaging channel failed
    #[error("Messaging transport error: {context}")]
    Transport {
        /// Details about the transport failure
        context: String,
    },

    /// Configuration was rejected at startup
    #[error("Invalid configuration: {message}")]
    Config {
        /// Description of the offending setting
        message: String,
    },
}

impl BridgeError {
    /// Create an invalid reading error from the raw payload
    pub fn invalid_reading(payload: impl Into<String>) -> Self {
        Self::InvalidReading {
            payload: payload.into(),
        }
    }

    /// Create an unknown command error
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Wrap a serial I/O error with the operation that was running
    pub fn serial_io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::SerialIo {
            context: context.into(),
            source,
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a messaging transport error
    pub fn transport(context: impl Into<String>) -> Self {
        Self::Transport {
            context: context.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this is a transient failure worth retrying
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport { .. })
    }

    /// Check if the error was caused by the caller's input
    ///
    /// Client errors map to a 400 response on the HTTP surface.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidReading { .. } | Self::UnknownCommand { .. } | Self::InvalidRequest { .. }
        )
    }

    /// Check if this error means the serial channel is gone for good
    #[must_use]
    pub const fn is_channel_lost(&self) -> bool {
        matches!(self, Self::SerialUnavailable | Self::SerialIo { .. })
    }
}

/// Specialized Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Helper trait for adding context to transport `Result`s
pub trait ResultExt<T> {
    /// Convert any displayable error into [`BridgeError::Transport`] prefixed with `context`
    ///
    /// # Errors
    /// Returns `Err(BridgeError)` if the underlying result is `Err`.
    fn transport_context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn transport_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| BridgeError::transport(format!("{}: {e}", context.into())))
    }
}

/// Helper trait tagging serial I/O failures with the operation in progress
pub trait IoResultExt<T> {
    /// Convert an I/O error into [`BridgeError::SerialIo`] tagged with `context`
    ///
    /// # Errors
    /// Returns `Err(BridgeError)` if the underlying result is `Err`.
    fn serial_context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn serial_context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|source| BridgeError::serial_io(context, source))
    }
}
