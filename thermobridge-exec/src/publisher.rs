// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Sampling-frequency publication with change suppression.

use async_trait::async_trait;
use std::sync::Arc;
use thermobridge_core::{Result, SamplingFrequency};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Outbound side of the messaging channel, as far as the frequency topic goes.
#[async_trait]
pub trait FrequencySink: Send + Sync {
    /// Emits `frequency` as the decimal millisecond value.
    async fn publish_frequency(&self, frequency: SamplingFrequency) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Equal to the last published value; nothing emitted.
    Unchanged,
    Published,
    /// The sink failed; the shadow keeps the previous value so the next change retries.
    Failed,
}

/// Emits the sampling frequency only when it differs from the last successfully
/// published value.
///
/// Compare-and-emit runs under one async lock, so concurrent callers never publish the
/// same value twice or interleave a stale value after a newer one.
pub struct FrequencyPublisher {
    sink: Arc<dyn FrequencySink>,
    last_published: Mutex<SamplingFrequency>,
}

impl FrequencyPublisher {
    /// The shadow starts at the device's power-on frequency.
    pub fn new(sink: Arc<dyn FrequencySink>) -> Self {
        Self::with_initial(sink, SamplingFrequency::NORMAL)
    }

    pub fn with_initial(sink: Arc<dyn FrequencySink>, initial: SamplingFrequency) -> Self {
        Self {
            sink,
            last_published: Mutex::new(initial),
        }
    }

    pub async fn publish(&self, frequency: SamplingFrequency) -> PublishOutcome {
        let mut last = self.last_published.lock().await;
        if *last == frequency {
            return PublishOutcome::Unchanged;
        }

        match self.sink.publish_frequency(frequency).await {
            Ok(()) => {
                info!(frequency_ms = frequency.millis(), "sampling frequency published");
                *last = frequency;
                PublishOutcome::Published
            }
            Err(err) => {
                warn!(
                    frequency_ms = frequency.millis(),
                    error = %err,
                    "sampling frequency publish failed"
                );
                PublishOutcome::Failed
            }
        }
    }

    pub async fn last_published(&self) -> SamplingFrequency {
        *self.last_published.lock().await
    }
}
