//! Error taxonomy for the aggregation core

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors produced by the aggregation core and the log source.
///
/// Apart from `Io`, every variant is a contract violation between
/// components rather than an expected runtime state.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// An aggregator was constructed with a window shorter than one second.
    #[error("window size must be at least one second")]
    InvalidWindowSize,

    /// A record was pushed into a window for a different second.
    #[error("record at {record} cannot join window at {window}")]
    WindowMismatch {
        window: DateTime<Utc>,
        record: DateTime<Utc>,
    },

    /// A window arrived at or before the timeline tail.
    #[error("window at {window} is not after timeline tail {tail}")]
    OutOfOrderWindow {
        window: DateTime<Utc>,
        tail: DateTime<Utc>,
    },

    /// A log line that does not match the expected CSV format.
    #[error("malformed log line: {0}")]
    MalformedRecord(String),

    /// I/O failure while reading the log file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
