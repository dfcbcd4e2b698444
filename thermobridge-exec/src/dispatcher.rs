// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Outbound serial traffic to the actuator.
//!
//! Every line, whether a forwarded temperature or a control code, goes through one async
//! lock around the writer, so lines from ingest and from HTTP handlers never interleave.
//! Each write is bounded by a timeout. An I/O failure closes the channel for good and the
//! bridge keeps running without the actuator.
//!
//! A timeout can fire after part of a line is already on the wire. The unsent tail is
//! kept and written before the next line, so the actuator never sees two lines glued
//! together. A line that timed out before its first byte went out is dropped.
//!
//! Callers that change the alarm latch and then emit the matching code hold a
//! [`SerialSession`] across both steps, so the codes reach the actuator in the same order
//! as the latch changes.

use crate::coordinator::Coordinator;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thermobridge_core::{ActuatorCommand, BridgeError, ControlCommand, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// Upper bound for writing and flushing a single line.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(500);

type SerialWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Bytes of the line currently being written.
#[derive(Debug, Default)]
struct PendingFrame {
    bytes: Vec<u8>,
    /// At least one byte of `bytes`' line has reached the writer.
    started: bool,
}

impl PendingFrame {
    fn load(&mut self, line: &str) {
        self.bytes.clear();
        self.bytes.extend_from_slice(line.as_bytes());
        self.bytes.push(b'\n');
        self.started = false;
    }

    fn discard_unstarted(&mut self) {
        if !self.started {
            self.bytes.clear();
        }
    }

    fn clear(&mut self) {
        self.bytes.clear();
        self.started = false;
    }

    /// Writes the remaining bytes and flushes.
    ///
    /// Cancel-safe: if the future is dropped, `bytes` holds exactly what has not been
    /// accepted by the writer yet.
    async fn write_to(&mut self, writer: &mut SerialWriter) -> io::Result<()> {
        while !self.bytes.is_empty() {
            let written = writer.write(&self.bytes).await?;
            if written == 0 {
                return Err(io::ErrorKind::WriteZero.into());
            }
            self.started = true;
            self.bytes.drain(..written);
        }
        self.started = false;
        writer.flush().await
    }
}

#[derive(Default)]
struct SerialSlot {
    writer: Option<SerialWriter>,
    pending: PendingFrame,
}

pub struct CommandDispatcher {
    coordinator: Arc<Coordinator>,
    slot: Mutex<SerialSlot>,
    write_timeout: Duration,
}

impl CommandDispatcher {
    /// Creates a dispatcher writing to an open serial channel.
    pub fn new<W>(coordinator: Arc<Coordinator>, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            coordinator,
            slot: Mutex::new(SerialSlot {
                writer: Some(Box::new(writer)),
                pending: PendingFrame::default(),
            }),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Creates a dispatcher with no serial channel; every send is dropped with a log line.
    pub fn disconnected(coordinator: Arc<Coordinator>) -> Self {
        Self {
            coordinator,
            slot: Mutex::new(SerialSlot::default()),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    /// Takes exclusive use of the serial channel until the session is dropped.
    pub async fn session(&self) -> SerialSession<'_> {
        SerialSession {
            slot: self.slot.lock().await,
            write_timeout: self.write_timeout,
        }
    }

    /// Sends a control code. Returns whether the line reached the channel.
    pub async fn send(&self, command: ActuatorCommand) -> bool {
        self.session().await.send(command).await
    }

    /// Forwards a raw temperature string to the actuator.
    pub async fn forward(&self, raw_temperature: &str) -> bool {
        self.session().await.forward(raw_temperature).await
    }

    /// Runs an operator command.
    ///
    /// `ResetAlarm` clears the latch and sends the reset code within one session; the
    /// mode commands only dispatch their code.
    pub async fn execute(&self, command: ControlCommand) -> bool {
        info!(%command, "executing control command");
        let mut session = self.session().await;
        if command == ControlCommand::ResetAlarm {
            self.coordinator.reset_alarm();
        }
        session.send(command.actuator_command()).await
    }

    /// Parses and runs an operator command.
    ///
    /// # Errors
    /// Returns [`BridgeError::UnknownCommand`] without touching any state when `command`
    /// is not one of the supported names.
    pub async fn execute_named(&self, command: &str) -> Result<ControlCommand> {
        let command: ControlCommand = command.parse()?;
        self.execute(command).await;
        Ok(command)
    }

    /// Writes `line` plus the terminator.
    ///
    /// # Errors
    /// See [`SerialSession::try_write_line`].
    pub async fn try_write_line(&self, line: &str) -> Result<()> {
        self.session().await.try_write_line(line).await
    }

    pub async fn is_open(&self) -> bool {
        self.slot.lock().await.writer.is_some()
    }

    /// Shuts the writer down after any in-flight line has been written.
    pub async fn close(&self) {
        let writer = {
            let mut slot = self.slot.lock().await;
            slot.pending.clear();
            slot.writer.take()
        };
        if let Some(mut writer) = writer {
            if let Err(err) = writer.shutdown().await {
                warn!(error = %err, "serial writer did not shut down cleanly");
            }
            info!("serial channel closed");
        }
    }
}

/// Exclusive use of the serial channel, obtained from [`CommandDispatcher::session`].
pub struct SerialSession<'a> {
    slot: MutexGuard<'a, SerialSlot>,
    write_timeout: Duration,
}

impl SerialSession<'_> {
    pub async fn send(&mut self, command: ActuatorCommand) -> bool {
        self.deliver(&command.to_string()).await
    }

    pub async fn forward(&mut self, raw_temperature: &str) -> bool {
        self.deliver(raw_temperature).await
    }

    /// Writes `line` plus the terminator, after the tail of any line cut off earlier.
    ///
    /// # Errors
    /// - [`BridgeError::SerialUnavailable`] if the channel is closed
    /// - [`BridgeError::SerialIo`] if the write failed; the channel is closed afterwards
    /// - [`BridgeError::Timeout`] if the write took longer than the write timeout
    pub async fn try_write_line(&mut self, line: &str) -> Result<()> {
        let SerialSlot { writer, pending } = &mut *self.slot;
        let Some(open) = writer.as_mut() else {
            return Err(BridgeError::SerialUnavailable);
        };

        pending.discard_unstarted();
        let write = async {
            if !pending.bytes.is_empty() {
                debug!(remaining = pending.bytes.len(), "completing interrupted line");
                pending.write_to(open).await?;
            }
            pending.load(line);
            pending.write_to(open).await
        };

        let outcome = tokio::time::timeout(self.write_timeout, write).await;
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => {
                *writer = None;
                pending.clear();
                Err(BridgeError::serial_io("writing actuator line", source))
            }
            Err(_) => Err(BridgeError::timeout("serial write", self.write_timeout)),
        }
    }

    async fn deliver(&mut self, line: &str) -> bool {
        match self.try_write_line(line).await {
            Ok(()) => {
                debug!(line, "sent to actuator");
                true
            }
            Err(BridgeError::SerialUnavailable) => {
                debug!(line, "serial channel closed, actuator line dropped");
                false
            }
            Err(err @ BridgeError::Timeout { .. }) => {
                warn!(line, error = %err, "actuator line dropped");
                false
            }
            Err(err) => {
                error!(line, error = %err, "serial channel lost, continuing without actuator");
                false
            }
        }
    }
}
