// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! In-memory serial channel and faulty writers.

use parking_lot::Mutex;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;
use tokio::io::{
    duplex, split, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream, ReadHalf,
    WriteHalf,
};
use tokio::time::timeout;

const LINK_BUFFER: usize = 4096;

/// Host side of an in-memory serial channel plus the simulated actuator.
pub struct SerialLink {
    /// Hand to the feedback listener.
    pub host_reader: ReadHalf<DuplexStream>,
    /// Hand to the command dispatcher.
    pub host_writer: WriteHalf<DuplexStream>,
    pub actuator: ActuatorEnd,
}

/// Creates a connected host/actuator pair.
pub fn serial_link() -> SerialLink {
    let (host, device) = duplex(LINK_BUFFER);
    let (host_reader, host_writer) = split(host);
    let (device_reader, device_writer) = split(device);

    SerialLink {
        host_reader,
        host_writer,
        actuator: ActuatorEnd {
            reader: BufReader::new(device_reader),
            writer: Some(device_writer),
        },
    }
}

/// The device end of a [`serial_link`].
pub struct ActuatorEnd {
    reader: BufReader<ReadHalf<DuplexStream>>,
    writer: Option<WriteHalf<DuplexStream>>,
}

impl ActuatorEnd {
    /// Next line written by the host, without the terminator.
    ///
    /// `None` on timeout or when the host side is closed.
    pub async fn read_line(&mut self, timeout_ms: u64) -> Option<String> {
        let mut line = String::new();
        match timeout(
            Duration::from_millis(timeout_ms),
            self.reader.read_line(&mut line),
        )
        .await
        {
            Ok(Ok(0)) | Ok(Err(_)) | Err(_) => None,
            Ok(Ok(_)) => Some(line.trim_end_matches('\n').to_owned()),
        }
    }

    /// Like [`ActuatorEnd::read_line`], but panics when no line arrives.
    pub async fn expect_line(&mut self, timeout_ms: u64) -> String {
        self.read_line(timeout_ms)
            .await
            .unwrap_or_else(|| panic!("Timeout: No line received within {timeout_ms} ms"))
    }

    /// Collects every line that arrives before the channel goes quiet for `quiet_ms`.
    pub async fn drain_lines(&mut self, quiet_ms: u64) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = self.read_line(quiet_ms).await {
            lines.push(line);
        }
        lines
    }

    pub async fn assert_no_line_within(&mut self, timeout_ms: u64) {
        if let Some(line) = self.read_line(timeout_ms).await {
            panic!("Unexpected line {line:?}, expected no output.");
        }
    }

    /// Sends a feedback line to the host; the terminator is appended.
    pub async fn write_line(&mut self, line: &str) {
        let writer = self
            .writer
            .as_mut()
            .expect("actuator writer already closed");
        writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("host side of the serial link is gone");
        writer.flush().await.expect("flush actuator line");
    }

    /// Sends raw bytes without a terminator.
    pub async fn write_raw(&mut self, bytes: &[u8]) {
        let writer = self
            .writer
            .as_mut()
            .expect("actuator writer already closed");
        writer.write_all(bytes).await.expect("write raw bytes");
        writer.flush().await.expect("flush raw bytes");
    }

    /// Closes the device-to-host direction; the host reader sees end-of-stream.
    pub async fn hang_up(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            writer.shutdown().await.expect("shut down actuator writer");
        }
    }
}

/// A writer whose every write fails, like an unplugged USB adapter.
#[derive(Debug, Default)]
pub struct FailingWriter;

impl AsyncWrite for FailingWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "serial device disconnected",
        )))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// A writer that never accepts a byte.
#[derive(Debug, Default)]
pub struct StallingWriter;

impl AsyncWrite for StallingWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Pending
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Pending
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// A writer that accepts a fixed number of bytes and then stalls until released.
///
/// Clones share the same wire, so a test keeps one handle while the dispatcher owns
/// the other.
#[derive(Debug, Clone)]
pub struct StutteringWriter {
    state: Arc<Mutex<StutterState>>,
}

#[derive(Debug)]
struct StutterState {
    budget: usize,
    released: bool,
    waker: Option<Waker>,
    wire: Vec<u8>,
}

impl StutteringWriter {
    /// Accepts `budget` bytes in total before stalling.
    pub fn new(budget: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(StutterState {
                budget,
                released: false,
                waker: None,
                wire: Vec::new(),
            })),
        }
    }

    /// Lifts the stall; every later write is accepted in full.
    pub fn release(&self) {
        let mut state = self.state.lock();
        state.released = true;
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
    }

    /// Everything accepted so far, as text.
    pub fn wire(&self) -> String {
        String::from_utf8_lossy(&self.state.lock().wire).into_owned()
    }
}

impl AsyncWrite for StutteringWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut state = self.state.lock();
        let accepted = if state.released {
            buf.len()
        } else {
            buf.len().min(state.budget)
        };
        if accepted == 0 && !buf.is_empty() {
            state.waker = Some(cx.waker().clone());
            return Poll::Pending;
        }
        state.budget = state.budget.saturating_sub(accepted);
        state.wire.extend_from_slice(&buf[..accepted]);
        Poll::Ready(Ok(accepted))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
