//! High-traffic alerting with hysteresis
//!
//! An alert is raised when the rolling requests-per-second average crosses
//! the threshold and clears only once the rate falls back below it, so the
//! notifier does not flap on every poll.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::round2;
use crate::error::MonitorError;
use crate::timeline::Timeline;
use crate::window::SecondWindow;

/// One alert lifetime: Alerting (no recovery time) then Recovered.
///
/// Fields are private so the only legal transitions are the ones below; a
/// recovered alert can never re-activate, only retire.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    rate: f64,
    created_at: DateTime<Utc>,
    shown: bool,
    recovered_at: Option<DateTime<Utc>>,
}

impl Alert {
    fn new(rate: f64, created_at: DateTime<Utc>) -> Self {
        Self {
            rate,
            created_at,
            shown: false,
            recovered_at: None,
        }
    }

    /// Requests-per-second value that raised the alert.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the creation event has already been delivered.
    pub fn shown(&self) -> bool {
        self.shown
    }

    pub fn recovered_at(&self) -> Option<DateTime<Utc>> {
        self.recovered_at
    }

    /// Time from creation to recovery, once recovered.
    pub fn recovery_duration(&self) -> Option<Duration> {
        self.recovered_at.map(|at| at - self.created_at)
    }

    /// Transition into the recovered state. Only the first transition
    /// sticks.
    fn recover(&mut self, at: DateTime<Utc>) {
        if self.recovered_at.is_none() {
            self.recovered_at = Some(at);
        }
    }

    fn mark_shown(&mut self) {
        self.shown = true;
    }
}

/// Runs the two-state alert machine over a rolling rate average.
pub struct AlertAggregator {
    timeline: Timeline,
    window_size: Duration,
    threshold: u32,
    alerts: Vec<Alert>,
}

impl AlertAggregator {
    pub fn new(window_size: Duration, threshold: u32) -> Result<Self, MonitorError> {
        if window_size < Duration::seconds(1) {
            return Err(MonitorError::InvalidWindowSize);
        }
        Ok(Self {
            timeline: Timeline::new(),
            window_size,
            threshold,
            alerts: Vec::new(),
        })
    }

    /// Admit the next second of traffic; same admission pattern as the
    /// summary aggregator, with the rate evaluated at rollover.
    pub fn update(&mut self, window: SecondWindow) -> Result<(), MonitorError> {
        let rolls_over = self
            .timeline
            .front()
            .is_some_and(|front| window.timestamp() - front.timestamp() > self.window_size);
        if rolls_over {
            self.evaluate();
            self.timeline.evict_up_to(window.timestamp());
        }
        self.timeline.append(window)
    }

    /// Compute the rolling rate and run the state machine.
    fn evaluate(&mut self) {
        if self.timeline.is_empty() {
            return;
        }
        let seconds = self.window_size.num_seconds();
        let rate = round2(self.timeline.total_records() as f64 / seconds as f64);
        let now = Utc::now();

        if rate < f64::from(self.threshold) {
            if let Some(active) = self.active_alert_mut() {
                info!(rate, "traffic recovered");
                active.recover(now);
            }
            return;
        }

        // Already alerting: no duplicate while the alert remains active.
        if self.active_alert().is_none() {
            warn!(rate, threshold = self.threshold, "high traffic alert raised");
            self.alerts.push(Alert::new(rate, now));
        }
    }

    /// The tail alert while it has not recovered yet.
    fn active_alert(&self) -> Option<&Alert> {
        self.alerts.last().filter(|alert| alert.recovered_at.is_none())
    }

    fn active_alert_mut(&mut self) -> Option<&mut Alert> {
        self.alerts
            .last_mut()
            .filter(|alert| alert.recovered_at.is_none())
    }

    pub fn has_notification(&self) -> bool {
        !self.alerts.is_empty()
    }

    /// The tail alert pending delivery, if any.
    pub fn notification(&self) -> Option<&Alert> {
        self.alerts.last()
    }

    /// Advance delivery state after the display layer rendered the tail
    /// alert: retire it if recovered, otherwise remember that its creation
    /// was announced so a later recovery can still be delivered.
    pub fn clear_notification(&mut self) {
        let Some(tail) = self.alerts.last_mut() else {
            return;
        };
        if tail.recovered_at.is_some() {
            self.alerts.pop();
        } else {
            tail.mark_shown();
        }
    }
}
