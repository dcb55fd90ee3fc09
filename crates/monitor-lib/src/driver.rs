//! The monitoring loop
//!
//! Pulls per-second windows from the log source, feeds both aggregators
//! and hands pending notifications to the display sink. The loop is the
//! only control flow: aggregation itself never blocks, and the sole
//! suspension points are the poll tick and the shutdown signal.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info};

use crate::aggregate::{Alert, AlertAggregator, Summary, SummaryAggregator};
use crate::error::MonitorError;
use crate::source::{SourcePoll, WindowSource};
use crate::window::SecondWindow;

/// Rendering half of the notification contract.
///
/// Implementations receive immutable snapshots and must not retain them
/// past the call: alerts advance state as soon as delivery is cleared.
pub trait NotificationSink {
    fn render_summary(&mut self, summary: &Summary);
    fn render_alert(&mut self, alert: &Alert);
}

/// Configuration for the monitoring loop.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Delay between terminal refresh attempts.
    pub poll_interval: Duration,
    /// Skip summary delivery. Aggregation continues regardless.
    pub suppress_summary: bool,
    /// Skip alert delivery. Aggregation continues regardless.
    pub suppress_alert: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            suppress_summary: false,
            suppress_alert: false,
        }
    }
}

/// Drives the source, the aggregators and the display sink.
pub struct Monitor<S, D> {
    source: S,
    sink: D,
    summary: SummaryAggregator,
    alert: AlertAggregator,
    config: MonitorConfig,
}

impl<S: WindowSource, D: NotificationSink> Monitor<S, D> {
    pub fn new(
        source: S,
        sink: D,
        summary: SummaryAggregator,
        alert: AlertAggregator,
        config: MonitorConfig,
    ) -> Self {
        Self {
            source,
            sink,
            summary,
            alert,
            config,
        }
    }

    /// Run until the source is exhausted or shutdown is signalled.
    ///
    /// Shutdown is cooperative: the signal is checked between windows, so
    /// the loop never stops mid-aggregation.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<(), MonitorError> {
        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "starting monitoring loop"
        );
        let mut ticker = interval(self.config.poll_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.source.poll_window()? {
                        SourcePoll::Window(window) => self.ingest(window)?,
                        SourcePoll::Pending => {}
                        SourcePoll::Exhausted => {
                            info!("log source exhausted");
                            break;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        info!("monitoring stopped");
        Ok(())
    }

    /// Feed one window through both aggregators, then deliver whatever
    /// notification is pending. Summary first: both read the same window.
    fn ingest(&mut self, window: SecondWindow) -> Result<(), MonitorError> {
        debug!(
            timestamp = %window.timestamp(),
            records = window.len(),
            "ingesting window"
        );
        self.summary.update(window.clone())?;
        self.alert.update(window)?;

        if !self.config.suppress_summary {
            if let Some(summary) = self.summary.notification() {
                self.sink.render_summary(summary);
                self.summary.clear_notification();
            }
        }
        if !self.config.suppress_alert {
            if let Some(alert) = self.alert.notification() {
                self.sink.render_alert(alert);
                self.alert.clear_notification();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LogRecord;
    use chrono::{DateTime, Duration as TimeDelta};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Scripted source for loop tests.
    struct ScriptedSource {
        polls: VecDeque<SourcePoll>,
    }

    impl ScriptedSource {
        fn new(polls: Vec<SourcePoll>) -> Self {
            Self {
                polls: polls.into(),
            }
        }
    }

    impl WindowSource for ScriptedSource {
        fn poll_window(&mut self) -> Result<SourcePoll, MonitorError> {
            Ok(self.polls.pop_front().unwrap_or(SourcePoll::Exhausted))
        }
    }

    /// Sink that records what was delivered. Clones share the buffers so
    /// tests can inspect them after the loop consumed the sink.
    #[derive(Clone, Default)]
    struct RecordingSink {
        summaries: Arc<Mutex<Vec<Summary>>>,
        alerts: Arc<Mutex<Vec<Alert>>>,
    }

    impl RecordingSink {
        fn summaries(&self) -> Vec<Summary> {
            self.summaries.lock().unwrap().clone()
        }

        fn alerts(&self) -> Vec<Alert> {
            self.alerts.lock().unwrap().clone()
        }
    }

    impl NotificationSink for RecordingSink {
        fn render_summary(&mut self, summary: &Summary) {
            self.summaries.lock().unwrap().push(summary.clone());
        }

        fn render_alert(&mut self, alert: &Alert) {
            self.alerts.lock().unwrap().push(alert.clone());
        }
    }

    fn window(seconds: i64, records: usize) -> SecondWindow {
        let mut window = SecondWindow::new(DateTime::from_timestamp(seconds, 0).unwrap());
        for _ in 0..records {
            let line =
                format!(r#""10.0.0.1","-","apache",{seconds},"GET /api HTTP/1.0",200,10"#);
            window.push(LogRecord::parse(&line).unwrap()).unwrap();
        }
        window
    }

    fn fast_config() -> MonitorConfig {
        MonitorConfig {
            poll_interval: Duration::from_millis(1),
            ..MonitorConfig::default()
        }
    }

    fn aggregators() -> (SummaryAggregator, AlertAggregator) {
        (
            SummaryAggregator::new(TimeDelta::seconds(1)).unwrap(),
            AlertAggregator::new(TimeDelta::seconds(1), 2).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_loop_delivers_summary_and_alert() {
        let source = ScriptedSource::new(vec![
            SourcePoll::Window(window(0, 3)),
            SourcePoll::Pending,
            SourcePoll::Window(window(2, 3)),
            SourcePoll::Window(window(4, 1)),
            SourcePoll::Window(window(6, 1)),
            SourcePoll::Exhausted,
        ]);
        let sink = RecordingSink::default();
        let (summary, alert) = aggregators();
        let (_tx, rx) = broadcast::channel(1);

        Monitor::new(source, sink.clone(), summary, alert, fast_config())
            .run(rx)
            .await
            .unwrap();

        // Rollovers at t=2, t=4 and t=6.
        let hits: Vec<usize> = sink.summaries().iter().map(|s| s.hits).collect();
        assert_eq!(hits, vec![3, 3, 1]);

        // Rate 3 crossed the threshold at t=2; the alert stayed pending
        // (already shown) at t=4 and recovered at t=6. The sink saw all
        // three deliveries and decides itself what to render for each.
        let alerts = sink.alerts();
        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].rate(), 3.0);
        assert!(!alerts[0].shown());
        assert!(alerts[0].recovered_at().is_none());
        assert!(alerts[1].shown());
        assert!(alerts[1].recovered_at().is_none());
        assert!(alerts[2].recovered_at().is_some());
    }

    #[tokio::test]
    async fn test_suppression_gates_delivery_only() {
        let source = ScriptedSource::new(vec![
            SourcePoll::Window(window(0, 3)),
            SourcePoll::Window(window(2, 3)),
            SourcePoll::Exhausted,
        ]);
        let sink = RecordingSink::default();
        let (summary, alert) = aggregators();
        let config = MonitorConfig {
            suppress_summary: true,
            suppress_alert: true,
            ..fast_config()
        };
        let (_tx, rx) = broadcast::channel(1);

        Monitor::new(source, sink.clone(), summary, alert, config)
            .run(rx)
            .await
            .unwrap();

        assert!(sink.summaries().is_empty());
        assert!(sink.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_stops_an_idle_loop() {
        // A source that never completes a window keeps the loop polling.
        struct IdleSource;
        impl WindowSource for IdleSource {
            fn poll_window(&mut self) -> Result<SourcePoll, MonitorError> {
                Ok(SourcePoll::Pending)
            }
        }

        let sink = RecordingSink::default();
        let (summary, alert) = aggregators();
        let (tx, rx) = broadcast::channel(1);

        let handle =
            tokio::spawn(Monitor::new(IdleSource, sink, summary, alert, fast_config()).run(rx));
        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop should stop on shutdown")
            .unwrap()
            .unwrap();
    }
}
