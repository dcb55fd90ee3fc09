//! Per-second grouping of log records

use chrono::{DateTime, Utc};

use crate::error::MonitorError;
use crate::record::LogRecord;

/// All records sharing one whole-second timestamp.
///
/// A window may be empty: the timeline synthesizes empty windows to fill
/// silent seconds.
#[derive(Debug, Clone)]
pub struct SecondWindow {
    timestamp: DateTime<Utc>,
    records: Vec<LogRecord>,
}

impl SecondWindow {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            records: Vec::new(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record from this window's second.
    ///
    /// Producers must only ever push matching records; a mismatch means an
    /// upstream bug, not a user-facing condition.
    pub fn push(&mut self, record: LogRecord) -> Result<(), MonitorError> {
        if record.timestamp != self.timestamp {
            return Err(MonitorError::WindowMismatch {
                window: self.timestamp,
                record: record.timestamp,
            });
        }
        self.records.push(record);
        Ok(())
    }
}
