// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Long-lived background tasks with cooperative cancellation.

use core::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// A spawned tokio task paired with the token that asks it to stop.
///
/// The spawned future receives a [`CancellationToken`] and is expected to return once
/// it fires. Dropping the handle cancels the token too, so a forgotten task does not
/// outlive its owner; [`BackgroundTask::stop`] cancels and waits for the result.
///
/// # Example
///
/// ```
/// use thermobridge_exec::BackgroundTask;
///
/// # #[tokio::main]
/// # async fn main() {
/// let task = BackgroundTask::spawn("ticker", |cancel| async move {
///     let mut ticks = 0u32;
///     while !cancel.is_cancelled() {
///         ticks += 1;
///         tokio::task::yield_now().await;
///     }
///     ticks
/// });
///
/// let ticks = task.stop().await;
/// assert!(ticks.is_some());
/// # }
/// ```
#[derive(Debug)]
pub struct BackgroundTask<T = ()> {
    name: &'static str,
    cancel: CancellationToken,
    handle: Option<JoinHandle<T>>,
}

impl<T: Send + 'static> BackgroundTask<T> {
    /// Spawns `f` on the current tokio runtime.
    pub fn spawn<F, Fut>(name: &'static str, f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        Self::spawn_with_token(name, CancellationToken::new(), f)
    }

    /// Spawns `f` with a caller-provided token, e.g. a child of a process-wide one.
    pub fn spawn_with_token<F, Fut>(name: &'static str, cancel: CancellationToken, f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let handle = tokio::spawn(f(cancel.clone()));
        debug!(task = name, "background task started");
        Self {
            name,
            cancel,
            handle: Some(handle),
        }
    }

    /// Signals the task to stop without waiting for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the task has returned (on its own or after cancellation).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Cancels the task and waits for it to return.
    ///
    /// Returns `None` if the task panicked or was aborted.
    pub async fn stop(mut self) -> Option<T> {
        self.cancel.cancel();
        self.wait().await
    }

    /// Waits for the task to return on its own.
    pub async fn join(mut self) -> Option<T> {
        self.wait().await
    }

    async fn wait(&mut self) -> Option<T> {
        let handle = self.handle.take()?;
        match handle.await {
            Ok(output) => {
                debug!(task = self.name, "background task finished");
                Some(output)
            }
            Err(err) => {
                error!(task = self.name, error = %err, "background task failed");
                None
            }
        }
    }
}

impl<T> Drop for BackgroundTask<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
