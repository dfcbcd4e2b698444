// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! In-memory frequency sink standing in for the broker.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thermobridge_core::{BridgeError, Result, SamplingFrequency};
use thermobridge_exec::FrequencySink;

/// Records every successful publish in order.
///
/// Failures can be injected with [`RecordingSink::fail_next`]; a failed publish is not
/// recorded. An optional delay widens race windows in concurrency tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    published: Mutex<Vec<SamplingFrequency>>,
    failures_left: AtomicUsize,
    attempts: AtomicUsize,
    delay: Option<Duration>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Makes the next `count` publishes fail with a transport error.
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<SamplingFrequency> {
        self.published.lock().clone()
    }

    pub fn published_millis(&self) -> Vec<u32> {
        self.published
            .lock()
            .iter()
            .map(|frequency| frequency.millis())
            .collect()
    }

    /// Every publish call, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrequencySink for RecordingSink {
    async fn publish_frequency(&self, frequency: SamplingFrequency) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(BridgeError::transport("injected publish failure"));
        }

        self.published.lock().push(frequency);
        Ok(())
    }
}
