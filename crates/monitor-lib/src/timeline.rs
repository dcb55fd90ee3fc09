//! Gap-filled timeline of per-second windows
//!
//! The timeline holds exactly one window per second between its head and
//! tail. Silent seconds in the source log are filled with empty windows on
//! append, so downstream rate math can divide by the window size directly.
//! Eviction policy belongs to the owning aggregator, not the timeline.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use crate::error::MonitorError;
use crate::window::SecondWindow;

/// A contiguous, strictly ascending FIFO of second-windows.
#[derive(Debug, Default)]
pub struct Timeline {
    queue: VecDeque<SecondWindow>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn front(&self) -> Option<&SecondWindow> {
        self.queue.front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Iterate the windows in timestamp order.
    pub fn windows(&self) -> impl Iterator<Item = &SecondWindow> {
        self.queue.iter()
    }

    /// Total record count across all windows.
    pub fn total_records(&self) -> usize {
        self.queue.iter().map(SecondWindow::len).sum()
    }

    /// Append the next window, synthesizing empty windows for any skipped
    /// seconds so the queue stays contiguous.
    ///
    /// Windows must arrive in strictly ascending timestamp order; anything
    /// else indicates an upstream bug.
    pub fn append(&mut self, window: SecondWindow) -> Result<(), MonitorError> {
        let Some(tail) = self.queue.back() else {
            self.queue.push_back(window);
            return Ok(());
        };

        if window.timestamp() <= tail.timestamp() {
            return Err(MonitorError::OutOfOrderWindow {
                window: window.timestamp(),
                tail: tail.timestamp(),
            });
        }

        let mut next = tail.timestamp() + Duration::seconds(1);
        while next < window.timestamp() {
            self.queue.push_back(SecondWindow::new(next));
            next += Duration::seconds(1);
        }
        self.queue.push_back(window);
        Ok(())
    }

    /// Drop windows from the front while their timestamp is at or before
    /// `cutoff`.
    pub fn evict_up_to(&mut self, cutoff: DateTime<Utc>) {
        while self
            .queue
            .front()
            .is_some_and(|window| window.timestamp() <= cutoff)
        {
            self.queue.pop_front();
        }
    }
}
