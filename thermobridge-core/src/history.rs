// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Bounded, insertion-ordered buffer of temperature readings.

use crate::reading::Reading;
use std::collections::VecDeque;

/// Maximum number of readings kept in [`History`].
pub const HISTORY_CAPACITY: usize = 50;

/// FIFO buffer of the most recent readings.
///
/// Appending past [`HISTORY_CAPACITY`] evicts the oldest entry, so the length never
/// exceeds the capacity. Iteration is always oldest first.
#[derive(Debug, Clone, Default)]
pub struct History {
    readings: VecDeque<Reading>,
}

impl History {
    pub fn new() -> Self {
        Self {
            readings: VecDeque::with_capacity(HISTORY_CAPACITY + 1),
        }
    }

    /// Appends `reading` at the tail, evicting from the head on overflow.
    pub fn append(&mut self, reading: Reading) {
        self.readings.push_back(reading);
        while self.readings.len() > HISTORY_CAPACITY {
            self.readings.pop_front();
        }
    }

    /// Removes every reading.
    pub fn clear(&mut self) {
        self.readings.clear();
    }

    /// Readings whose age at `now` lies in `0..=duration_ms`, in insertion order.
    ///
    /// Readings stamped after `now` (the wall clock was set back) are not in the window.
    pub fn in_window(&self, now: i64, duration_ms: i64) -> impl Iterator<Item = &Reading> {
        self.readings
            .iter()
            .filter(move |reading| (0..=duration_ms).contains(&reading.age(now)))
    }

    /// The most recently appended reading, if any.
    pub fn latest(&self) -> Option<&Reading> {
        self.readings.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Copies the buffer, oldest first.
    pub fn to_vec(&self) -> Vec<Reading> {
        self.readings.iter().copied().collect()
    }
}
