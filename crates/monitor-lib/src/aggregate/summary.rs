//! Periodic traffic summaries over a tumbling window

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use super::{round2, top_sections};
use crate::error::MonitorError;
use crate::record::LogRecord;
use crate::timeline::Timeline;
use crate::window::SecondWindow;

/// How many sections a summary ranks.
const TOP_SECTIONS: usize = 10;

/// Hit counts for one section within a single rollup.
#[derive(Debug, Clone, Serialize)]
pub struct SectionStat {
    pub name: String,
    pub hits: usize,
    /// The records behind the count. Not serialized; the rendered
    /// notification only carries the grouping.
    #[serde(skip)]
    pub records: Vec<LogRecord>,
}

/// Point-in-time rollup over one summary window.
///
/// Immutable once produced; the next rollover replaces it wholesale.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub hits: usize,
    pub total_bytes: u64,
    pub errors: usize,
    pub error_percentage: f64,
    pub top_sections: Vec<SectionStat>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Aggregates traffic into tumbling-window summaries.
pub struct SummaryAggregator {
    timeline: Timeline,
    window_size: Duration,
    notification: Option<Summary>,
}

impl SummaryAggregator {
    pub fn new(window_size: Duration) -> Result<Self, MonitorError> {
        if window_size < Duration::seconds(1) {
            return Err(MonitorError::InvalidWindowSize);
        }
        Ok(Self {
            timeline: Timeline::new(),
            window_size,
            notification: None,
        })
    }

    /// Admit the next second of traffic.
    ///
    /// When the incoming window lands past the current window's horizon,
    /// the rollup is computed first and the timeline tumbles (empties)
    /// before the window is appended.
    pub fn update(&mut self, window: SecondWindow) -> Result<(), MonitorError> {
        let rolls_over = self
            .timeline
            .front()
            .is_some_and(|front| window.timestamp() - front.timestamp() > self.window_size);
        if rolls_over {
            self.roll_up();
            self.timeline.evict_up_to(window.timestamp());
        }
        self.timeline.append(window)
    }

    pub fn has_notification(&self) -> bool {
        self.notification.is_some()
    }

    pub fn notification(&self) -> Option<&Summary> {
        self.notification.as_ref()
    }

    /// Discard the stored summary. Safe to call repeatedly; the next
    /// rollover produces a fresh one.
    pub fn clear_notification(&mut self) {
        self.notification = None;
    }

    /// Compute rollup statistics over the current timeline contents.
    ///
    /// A timeline holding only gap-filler windows produces no summary.
    fn roll_up(&mut self) {
        let records: Vec<&LogRecord> = self
            .timeline
            .windows()
            .flat_map(|window| window.records())
            .collect();
        let Some(first) = records.first() else {
            return;
        };

        let hits = records.len();
        let total_bytes = records.iter().map(|record| record.bytes).sum();
        let errors = records.iter().filter(|record| record.is_error()).count();
        let start_time = first.timestamp;
        debug!(hits, errors, %start_time, "summary window rolled over");

        self.notification = Some(Summary {
            hits,
            total_bytes,
            errors,
            error_percentage: round2(errors as f64 / hits as f64 * 100.0),
            top_sections: top_sections(&self.timeline, TOP_SECTIONS),
            start_time,
            end_time: start_time + self.window_size,
        });
    }
}
