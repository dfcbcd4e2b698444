// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities and fixtures for the thermobridge workspace.
//!
//! Nothing here is meant for production code. The fixtures replace the three outside
//! dependencies of the runtime crate:
//!
//! - time: [`ManualClock`] stamps readings with a value the test controls
//! - the serial port: [`serial_link`] returns an in-memory pair built on
//!   `tokio::io::duplex`, with an [`ActuatorEnd`] standing in for the device
//! - the broker: [`RecordingSink`] records every frequency publish and can fail on demand
//!
//! [`BridgeHarness`] wires all three into a ready-to-use ingest pipeline.
//!
//! # Example
//!
//! ```rust
//! use thermobridge_test_utils::BridgeHarness;
//!
//! # async fn example() {
//! let mut harness = BridgeHarness::new();
//! harness.gateway.on_message(b"27.0").await.unwrap();
//!
//! assert_eq!(harness.actuator.expect_line(100).await, "27.0");
//! assert_eq!(harness.sink.published_millis(), vec![2000]);
//! # }
//! ```

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
pub mod clock;
pub mod harness;
pub mod helpers;
pub mod serial;
pub mod sink;

pub use clock::ManualClock;
pub use harness::BridgeHarness;
pub use helpers::{feed_readings, wait_until};
pub use serial::{
    serial_link, ActuatorEnd, FailingWriter, SerialLink, StallingWriter, StutteringWriter,
};
pub use sink::RecordingSink;
