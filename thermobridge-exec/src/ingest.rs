// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Temperature ingest: messaging payload in, actuator lines and frequency updates out.

use crate::coordinator::Coordinator;
use crate::dispatcher::CommandDispatcher;
use crate::publisher::FrequencyPublisher;
use std::sync::Arc;
use thermobridge_core::{
    parse_celsius, ActuatorCommand, Clock, Reading, Result, SystemClock, SystemState, Transition,
};
use tracing::warn;

pub struct IngestGateway {
    coordinator: Arc<Coordinator>,
    dispatcher: Arc<CommandDispatcher>,
    publisher: Arc<FrequencyPublisher>,
    clock: Arc<dyn Clock>,
}

impl IngestGateway {
    pub fn new(
        coordinator: Arc<Coordinator>,
        dispatcher: Arc<CommandDispatcher>,
        publisher: Arc<FrequencyPublisher>,
    ) -> Self {
        Self::with_clock(coordinator, dispatcher, publisher, Arc::new(SystemClock))
    }

    pub fn with_clock(
        coordinator: Arc<Coordinator>,
        dispatcher: Arc<CommandDispatcher>,
        publisher: Arc<FrequencyPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            coordinator,
            dispatcher,
            publisher,
            clock,
        }
    }

    /// Handles one temperature payload.
    ///
    /// The reading is stamped with the arrival time and recorded under the coordinator
    /// lock while the serial session is held. Afterwards, in order: the alarm code goes
    /// out if the alarm just fired, the trimmed payload is forwarded unless the system is
    /// in alarm, and the sampling frequency is published if it changed.
    ///
    /// Holding the session across the transition keeps the alarm code from overtaking a
    /// concurrent reset on the wire.
    ///
    /// # Errors
    /// Returns [`thermobridge_core::BridgeError::InvalidReading`] for a payload that is
    /// not a finite number. Nothing is recorded, forwarded or published in that case.
    pub async fn on_message(&self, payload: &[u8]) -> Result<Transition> {
        let value = parse_celsius(payload).inspect_err(|err| {
            warn!(error = %err, "temperature payload discarded");
        })?;

        let mut serial = self.dispatcher.session().await;
        let reading = Reading::new(self.clock.now_millis(), value);
        let transition = self.coordinator.record_reading(reading);

        if transition.alarm_triggered {
            serial.send(ActuatorCommand::AlarmTrigger).await;
        }
        if transition.current != SystemState::Alarm {
            let raw = String::from_utf8_lossy(payload);
            serial.forward(raw.trim()).await;
        }
        drop(serial);

        self.publisher.publish(transition.frequency).await;

        Ok(transition)
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }
}
