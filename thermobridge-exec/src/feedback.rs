// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Inbound serial feedback from the actuator.

use crate::coordinator::Coordinator;
use crate::task::BackgroundTask;
use std::sync::Arc;
use thermobridge_core::Feedback;
use thermobridge_error::BridgeError;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Why the feedback listener returned.
#[derive(Debug)]
pub enum ListenerExit {
    /// Shutdown was requested.
    Cancelled,
    /// The actuator side closed the channel.
    Closed,
    /// Reading failed; the listener does not retry.
    Failed(BridgeError),
}

/// Reads '\n'-terminated lines from the actuator for as long as the channel stays open.
///
/// Integer lines update the window tilt on the [`Coordinator`]; anything else is logged.
/// Exactly one listener runs per serial channel.
pub struct FeedbackListener;

impl FeedbackListener {
    pub fn spawn<R>(reader: R, coordinator: Arc<Coordinator>) -> BackgroundTask<ListenerExit>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        BackgroundTask::spawn("feedback-listener", move |cancel| {
            Self::run(reader, coordinator, cancel)
        })
    }

    /// Runs the listener on the current task until `cancel` fires or the channel ends.
    pub async fn run<R>(
        reader: R,
        coordinator: Arc<Coordinator>,
        cancel: CancellationToken,
    ) -> ListenerExit
    where
        R: AsyncRead + Send + Unpin,
    {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            let read = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("feedback listener cancelled");
                    return ListenerExit::Cancelled;
                }
                read = reader.read_until(b'\n', &mut buf) => read,
            };

            match read {
                Ok(0) => {
                    if !buf.is_empty() {
                        handle_line(&coordinator, &buf);
                    }
                    info!("actuator closed the serial channel");
                    return ListenerExit::Closed;
                }
                Ok(_) => {
                    handle_line(&coordinator, &buf);
                    buf.clear();
                }
                Err(source) => {
                    let err = BridgeError::serial_io("reading actuator feedback", source);
                    warn!(error = %err, "feedback listener stopped");
                    return ListenerExit::Failed(err);
                }
            }
        }
    }
}

fn handle_line(coordinator: &Coordinator, raw: &[u8]) {
    let line = String::from_utf8_lossy(raw);
    match Feedback::parse_line(&line) {
        Feedback::Tilt(tilt) => coordinator.set_window_tilt(tilt),
        Feedback::Diagnostic(text) if text.is_empty() => {}
        Feedback::Diagnostic(text) => info!(message = %text, "actuator diagnostic"),
    }
}
