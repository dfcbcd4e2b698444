// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions)]
//! Runtime side of the thermobridge.
//!
//! The [`Coordinator`] is the single mutual-exclusion domain that owns the history, the
//! state machine, the latest temperature and the window tilt. Everything else in this
//! crate talks to the outside world and feeds it:
//!
//! - [`IngestGateway`] turns messaging payloads into readings and transitions
//! - [`CommandDispatcher`] writes actuator lines on the serial channel
//! - [`FeedbackListener`] drains actuator feedback in one background task
//! - [`FrequencyPublisher`] emits the sampling frequency when it changes
//!
//! Serial writes and publishes never run while the coordinator lock is held. A caller that
//! needs both takes the serial session first and the coordinator lock second.

pub mod coordinator;
pub mod dispatcher;
pub mod feedback;
pub mod ingest;
pub mod publisher;
pub mod task;

pub use coordinator::{Coordinator, Snapshot};
pub use dispatcher::{CommandDispatcher, SerialSession, DEFAULT_WRITE_TIMEOUT};
pub use feedback::{FeedbackListener, ListenerExit};
pub use ingest::IngestGateway;
pub use publisher::{FrequencyPublisher, FrequencySink, PublishOutcome};
pub use task::BackgroundTask;
pub use tokio_util::sync::CancellationToken;
