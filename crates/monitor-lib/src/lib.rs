//! Core library for the traffic monitor
//!
//! This crate provides the windowed streaming-aggregation engine:
//! - Typed access-log records grouped into per-second windows
//! - A gap-filled, contiguous timeline of windows
//! - Periodic traffic summaries over a tumbling window
//! - A hysteresis-based high-traffic alert machine
//! - The tail-following log source and the monitoring loop

pub mod aggregate;
pub mod driver;
pub mod error;
pub mod record;
pub mod source;
pub mod timeline;
pub mod window;

pub use aggregate::{Alert, AlertAggregator, SectionStat, Summary, SummaryAggregator};
pub use driver::{Monitor, MonitorConfig, NotificationSink};
pub use error::MonitorError;
pub use record::LogRecord;
pub use source::{LogSource, SourcePoll, WindowSource};
pub use timeline::Timeline;
pub use window::SecondWindow;
