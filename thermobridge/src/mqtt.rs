// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! MQTT transport: the temperature subscription and the frequency topic.
//!
//! The event loop runs in one task and hands each temperature payload to the ingest
//! gateway before polling again, so readings are processed in arrival order. Client
//! requests made from inside that task use the non-blocking `try_*` calls; awaiting the
//! bounded request channel there would stall the loop that drains it.

use crate::config::BridgeConfig;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;
use thermobridge_core::{Result, SamplingFrequency};
use thermobridge_error::ResultExt;
use thermobridge_exec::{FrequencySink, IngestGateway};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Capacity of the client-to-event-loop request channel.
pub const REQUEST_CAPACITY: usize = 64;

const RETRY_BASE_MS: u64 = 1_000;
const DISCONNECT_GRACE: Duration = Duration::from_secs(1);

pub fn mqtt_options(config: &BridgeConfig) -> MqttOptions {
    let mut options = MqttOptions::new(
        config.client_id(),
        config.broker_host.clone(),
        config.broker_port,
    );
    options.set_keep_alive(config.keep_alive());
    options.set_clean_session(true);
    options
}

/// Creates the client and its event loop; nothing connects until the loop is polled.
pub fn connect(config: &BridgeConfig) -> (AsyncClient, EventLoop) {
    let options = mqtt_options(config);
    info!(
        client_id = %options.client_id(),
        broker = %config.broker_host,
        port = config.broker_port,
        "mqtt client created"
    );
    AsyncClient::new(options, REQUEST_CAPACITY)
}

/// Publishes the sampling frequency at QoS 1, not retained.
#[derive(Clone)]
pub struct MqttSink {
    client: AsyncClient,
    topic: String,
}

impl MqttSink {
    pub fn new(client: AsyncClient, topic: impl Into<String>) -> Self {
        Self {
            client,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl FrequencySink for MqttSink {
    async fn publish_frequency(&self, frequency: SamplingFrequency) -> Result<()> {
        self.client
            .try_publish(
                self.topic.as_str(),
                QoS::AtLeastOnce,
                false,
                frequency.to_string(),
            )
            .transport_context(format!("publishing to {}", self.topic))
    }
}

/// Polls `eventloop` until `cancel` fires, then unsubscribes and disconnects.
///
/// The subscription is renewed on every connection acknowledgment, so a broker that
/// dropped the session gets it back after a reconnect. Connection errors are logged and
/// retried after a jittered pause.
pub async fn run_event_loop(
    client: AsyncClient,
    mut eventloop: EventLoop,
    temperature_topic: String,
    gateway: Arc<IngestGateway>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = eventloop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                info!(code = ?ack.code, "mqtt connected");
                match client.try_subscribe(temperature_topic.as_str(), QoS::ExactlyOnce) {
                    Ok(()) => info!(topic = %temperature_topic, "subscribing"),
                    Err(err) => warn!(topic = %temperature_topic, error = %err, "subscribe failed"),
                }
            }
            Ok(Event::Incoming(Packet::SubAck(ack))) => {
                debug!(codes = ?ack.return_codes, "subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) if publish.topic == temperature_topic => {
                // Rejected payloads are logged by the gateway.
                let _ = gateway.on_message(&publish.payload).await;
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                debug!(topic = %publish.topic, "message on unexpected topic ignored");
            }
            Ok(Event::Incoming(Packet::Disconnect)) => warn!("broker closed the mqtt session"),
            Ok(_) => {}
            Err(err) => {
                let retry_in_ms = RETRY_BASE_MS + fastrand::u64(..RETRY_BASE_MS);
                warn!(error = %err, retry_in_ms, "mqtt connection error");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(Duration::from_millis(retry_in_ms)) => {}
                }
            }
        }
    }

    disconnect(&client, &mut eventloop, &temperature_topic).await;
}

async fn disconnect(client: &AsyncClient, eventloop: &mut EventLoop, topic: &str) {
    if let Err(err) = client.try_unsubscribe(topic) {
        debug!(error = %err, "unsubscribe not sent");
    }
    if let Err(err) = client.try_disconnect() {
        debug!(error = %err, "disconnect not sent");
    }

    // Flush the queued requests until the disconnect packet leaves or the link fails.
    let drain = async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    };
    if tokio::time::timeout(DISCONNECT_GRACE, drain).await.is_err() {
        debug!("mqtt disconnect did not complete in time");
    }
    info!("mqtt client stopped");
}
