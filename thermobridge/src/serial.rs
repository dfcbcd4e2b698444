// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Serial port access for the actuator.

use thermobridge_error::{IoResultExt, Result};
use tokio::io::{split, ReadHalf, WriteHalf};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::info;

/// The two directions of an open serial port.
pub struct SerialHalves {
    pub reader: ReadHalf<SerialStream>,
    pub writer: WriteHalf<SerialStream>,
}

/// Opens `path` as 8N1 at `baud_rate` and splits it for the listener and the dispatcher.
///
/// # Errors
/// Returns [`thermobridge_error::BridgeError::SerialIo`] when the device cannot be opened.
pub fn open(path: &str, baud_rate: u32) -> Result<SerialHalves> {
    let stream = tokio_serial::new(path, baud_rate)
        .open_native_async()
        .map_err(std::io::Error::from)
        .serial_context(format!("opening {path}"))?;

    info!(port = path, baud_rate, "serial port opened");
    let (reader, writer) = split(stream);
    Ok(SerialHalves { reader, writer })
}
