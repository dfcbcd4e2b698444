// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::io;
use std::time::Duration;
use thermobridge_error::{BridgeError, IoResultExt, Result, ResultExt};

#[test]
fn test_error_display() {
    let err = BridgeError::invalid_reading("abc");
    assert_eq!(err.to_string(), "Invalid temperature payload: \"abc\"");

    let err = BridgeError::unknown_command("OPEN_WINDOW");
    assert_eq!(err.to_string(), "Unknown command: \"OPEN_WINDOW\"");

    let err = BridgeError::SerialUnavailable;
    assert_eq!(err.to_string(), "Serial channel unavailable");
}

#[test]
fn test_error_constructors() {
    let err = BridgeError::invalid_request("missing field `command`");
    assert!(matches!(err, BridgeError::InvalidRequest { .. }));

    let err = BridgeError::timeout("serial write", Duration::from_millis(500));
    assert!(matches!(err, BridgeError::Timeout { .. }));
    assert!(err.to_string().contains("serial write"));
}

#[test]
fn test_client_errors_are_classified() {
    assert!(BridgeError::invalid_reading("x").is_client_error());
    assert!(BridgeError::unknown_command("x").is_client_error());
    assert!(BridgeError::invalid_request("x").is_client_error());
    assert!(!BridgeError::SerialUnavailable.is_client_error());
    assert!(!BridgeError::transport("broker down").is_client_error());
}

#[test]
fn test_is_recoverable() {
    assert!(BridgeError::transport("publish failed").is_recoverable());
    assert!(BridgeError::timeout("write", Duration::from_secs(1)).is_recoverable());
    assert!(!BridgeError::SerialUnavailable.is_recoverable());
    assert!(!BridgeError::config("bad port").is_recoverable());
}

#[test]
fn test_channel_lost() {
    let err = BridgeError::serial_io("reading feedback", io::Error::from(io::ErrorKind::BrokenPipe));
    assert!(err.is_channel_lost());
    assert!(BridgeError::SerialUnavailable.is_channel_lost());
    assert!(!BridgeError::transport("x").is_channel_lost());
}

#[test]
fn test_transport_context() {
    let result: std::result::Result<(), String> = Err("connection refused".to_string());

    let err = result.transport_context("publishing frequency").unwrap_err();

    assert!(matches!(err, BridgeError::Transport { .. }));
    assert_eq!(
        err.to_string(),
        "Messaging transport error: publishing frequency: connection refused"
    );
}

#[test]
fn test_serial_context_keeps_source() {
    let result: io::Result<()> = Err(io::Error::from(io::ErrorKind::TimedOut));

    let err: BridgeError = result.serial_context("writing command").unwrap_err();

    let source = std::error::Error::source(&err).expect("source should be kept");
    assert!(source.to_string().contains("timed out"));
    assert!(err.to_string().starts_with("Serial I/O failed while writing command"));
}

#[test]
fn test_result_alias() -> anyhow::Result<()> {
    fn parse(payload: &str) -> Result<f64> {
        payload
            .parse()
            .map_err(|_| BridgeError::invalid_reading(payload))
    }

    assert_eq!(parse("27.0")?, 27.0);
    assert!(parse("hot").is_err());
    Ok(())
}
