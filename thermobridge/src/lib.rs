// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! thermobridge: MQTT temperature readings in, serial actuator commands out, with an HTTP
//! query and command surface on top.
//!
//! ```text
//!  sensor ──MQTT──▶ mqtt::run_event_loop ──▶ IngestGateway ──▶ Coordinator
//!                          ▲                      │  │
//!                          │                      │  └──▶ CommandDispatcher ──serial──▶ actuator
//!  sensor ◀──MQTT── MqttSink ◀── FrequencyPublisher        ▲                              │
//!                                                          │                              │
//!  browser ──HTTP──▶ http::router ─────────────────────────┘      FeedbackListener ◀──────┘
//! ```
//!
//! The pure state lives in `thermobridge-core`, the coordination runtime in
//! `thermobridge-exec`; this crate supplies the transports and the process lifecycle.

pub mod bridge;
pub mod config;
pub mod http;
pub mod mqtt;
pub mod serial;

pub use bridge::Bridge;
pub use config::BridgeConfig;
