// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::clock::ManualClock;
use crate::serial::{serial_link, ActuatorEnd};
use crate::sink::RecordingSink;
use std::sync::Arc;
use thermobridge_core::AlarmWindow;
use thermobridge_exec::{
    BackgroundTask, CommandDispatcher, Coordinator, FeedbackListener, FrequencyPublisher,
    IngestGateway, ListenerExit,
};

/// Start time of the harness clock; any positive value works.
pub const HARNESS_EPOCH_MS: i64 = 1_700_000_000_000;

/// A complete ingest pipeline over in-memory fakes.
pub struct BridgeHarness {
    pub clock: Arc<ManualClock>,
    pub coordinator: Arc<Coordinator>,
    pub dispatcher: Arc<CommandDispatcher>,
    pub sink: Arc<RecordingSink>,
    pub publisher: Arc<FrequencyPublisher>,
    pub gateway: IngestGateway,
    pub listener: BackgroundTask<ListenerExit>,
    pub actuator: ActuatorEnd,
}

impl BridgeHarness {
    pub fn new() -> Self {
        Self::with_window(AlarmWindow::default())
    }

    /// Must be called inside a tokio runtime; the feedback listener is spawned.
    pub fn with_window(window: AlarmWindow) -> Self {
        let link = serial_link();
        let clock = Arc::new(ManualClock::new(HARNESS_EPOCH_MS));
        let coordinator = Arc::new(Coordinator::new(window));
        let dispatcher = Arc::new(CommandDispatcher::new(
            Arc::clone(&coordinator),
            link.host_writer,
        ));
        let sink = Arc::new(RecordingSink::new());
        let publisher = Arc::new(FrequencyPublisher::new(sink.clone()));
        let gateway = IngestGateway::with_clock(
            Arc::clone(&coordinator),
            Arc::clone(&dispatcher),
            Arc::clone(&publisher),
            clock.clone(),
        );
        let listener = FeedbackListener::spawn(link.host_reader, Arc::clone(&coordinator));

        Self {
            clock,
            coordinator,
            dispatcher,
            sink,
            publisher,
            gateway,
            listener,
            actuator: link.actuator,
        }
    }
}
