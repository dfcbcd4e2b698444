// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::clock::ManualClock;
use std::time::Duration;
use thermobridge_core::Transition;
use thermobridge_exec::IngestGateway;
use tokio::time::{sleep, Instant};

/// Feeds `values` through the gateway, advancing `clock` by `step_ms` after each one.
pub async fn feed_readings(
    gateway: &IngestGateway,
    clock: &ManualClock,
    values: &[f64],
    step_ms: i64,
) -> Vec<Transition> {
    let mut transitions = Vec::with_capacity(values.len());
    for value in values {
        let payload = value.to_string();
        let transition = gateway
            .on_message(payload.as_bytes())
            .await
            .expect("reading should parse");
        transitions.push(transition);
        clock.advance(step_ms);
    }
    transitions
}

/// Polls `condition` until it holds, panicking after `timeout_ms`.
pub async fn wait_until<F>(timeout_ms: u64, mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    while !condition() {
        assert!(
            Instant::now() < deadline,
            "Timeout: condition not met within {timeout_ms} ms"
        );
        sleep(Duration::from_millis(5)).await;
    }
}
