// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Process lifecycle: wiring at startup, ordered teardown at shutdown.

use crate::config::BridgeConfig;
use crate::http::{self, AppState};
use crate::mqtt::{self, MqttSink};
use crate::serial;
use anyhow::Context;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use thermobridge_exec::{
    BackgroundTask, CommandDispatcher, Coordinator, FeedbackListener, FrequencyPublisher,
    IngestGateway, ListenerExit,
};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// A running bridge.
///
/// Owns the three long-lived tasks: the feedback listener (absent when the serial port
/// could not be opened), the MQTT event loop and the HTTP server.
pub struct Bridge {
    coordinator: Arc<Coordinator>,
    dispatcher: Arc<CommandDispatcher>,
    listener: Option<BackgroundTask<ListenerExit>>,
    mqtt: BackgroundTask,
    http: BackgroundTask<io::Result<()>>,
    http_addr: SocketAddr,
}

impl Bridge {
    /// Validates `config` and starts every component.
    ///
    /// A serial port that cannot be opened is not an error: the bridge runs without the
    /// actuator and logs every line it would have sent.
    ///
    /// # Errors
    /// Fails on invalid configuration or when the HTTP address cannot be bound.
    pub async fn start(config: &BridgeConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let coordinator = Arc::new(Coordinator::new(config.alarm_window()));

        let (dispatcher, listener) = match serial::open(&config.serial_port, config.baud_rate) {
            Ok(halves) => {
                let dispatcher = CommandDispatcher::new(Arc::clone(&coordinator), halves.writer);
                let listener = FeedbackListener::spawn(halves.reader, Arc::clone(&coordinator));
                (dispatcher, Some(listener))
            }
            Err(err) => {
                warn!(
                    port = %config.serial_port,
                    error = %err,
                    "serial port unavailable, running without actuator"
                );
                (CommandDispatcher::disconnected(Arc::clone(&coordinator)), None)
            }
        };
        let dispatcher = Arc::new(dispatcher.with_write_timeout(config.write_timeout()));

        let (client, eventloop) = mqtt::connect(config);
        let sink = Arc::new(MqttSink::new(client.clone(), config.frequency_topic.clone()));
        let publisher = Arc::new(FrequencyPublisher::new(sink));
        let gateway = Arc::new(IngestGateway::new(
            Arc::clone(&coordinator),
            Arc::clone(&dispatcher),
            publisher,
        ));
        let topic = config.temperature_topic.clone();
        let mqtt = BackgroundTask::spawn("mqtt-event-loop", move |cancel| {
            mqtt::run_event_loop(client, eventloop, topic, gateway, cancel)
        });

        let tcp = TcpListener::bind(config.http_addr)
            .await
            .with_context(|| format!("binding http address {}", config.http_addr))?;
        let http_addr = tcp.local_addr()?;
        let router = http::router(
            AppState {
                coordinator: Arc::clone(&coordinator),
                dispatcher: Arc::clone(&dispatcher),
            },
            config.web_root.as_deref(),
        );
        let http = BackgroundTask::spawn("http-server", move |cancel| {
            http::serve(tcp, router, cancel)
        });

        info!(%http_addr, serial = listener.is_some(), "bridge started");
        Ok(Self {
            coordinator,
            dispatcher,
            listener,
            mqtt,
            http,
            http_addr,
        })
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn dispatcher(&self) -> &Arc<CommandDispatcher> {
        &self.dispatcher
    }

    /// The bound HTTP address; differs from the configured one when port 0 was requested.
    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    pub fn has_actuator(&self) -> bool {
        self.listener.is_some()
    }

    /// Stops the feedback listener, closes the serial channel, leaves the broker and
    /// finally stops the HTTP server, in that order.
    pub async fn shutdown(self) {
        let Self {
            dispatcher,
            listener,
            mqtt,
            http,
            ..
        } = self;
        info!("bridge shutting down");

        if let Some(listener) = listener {
            let exit = listener.stop().await;
            debug!(?exit, "feedback listener stopped");
        }
        dispatcher.close().await;
        mqtt.stop().await;
        if let Some(Err(err)) = http.stop().await {
            error!(error = %err, "http server failed");
        }

        info!("bridge stopped");
    }
}
