use std::time::{Duration, Instant};
use tracing::debug;

/// Cosmetic liveness indicator of the alert feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Updating,
    Disconnected,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "Live",
            ConnectionStatus::Updating => "Updating",
            ConnectionStatus::Disconnected => "Offline",
        }
    }
}

/// Fixed-period status pulse, polled from the event loop.
/// Every `period` the status reads `Updating` for `pulse`, then `Connected` again.
pub struct StatusTicker {
    period: Duration,
    pulse: Duration,
    started: Option<Instant>,
}

impl StatusTicker {
    pub const PERIOD: Duration = Duration::from_secs(30);
    pub const PULSE: Duration = Duration::from_secs(1);

    pub fn new(period: Duration, pulse: Duration) -> Self {
        Self {
            period,
            pulse: pulse.min(period),
            started: None,
        }
    }

    pub fn start(&mut self, now: Instant) {
        if self.started.is_none() {
            debug!(period_ms = self.period.as_millis() as u64, "status ticker started");
            self.started = Some(now);
        }
    }

    pub fn stop(&mut self) {
        if self.started.take().is_some() {
            debug!("status ticker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    pub fn status(&self, now: Instant) -> ConnectionStatus {
        let Some(started) = self.started else {
            return ConnectionStatus::Disconnected;
        };
        let elapsed = now.saturating_duration_since(started);
        if elapsed < self.period || self.period.is_zero() {
            return ConnectionStatus::Connected;
        }
        let phase = elapsed.as_millis() % self.period.as_millis();
        if phase < self.pulse.as_millis() {
            ConnectionStatus::Updating
        } else {
            ConnectionStatus::Connected
        }
    }
}

impl Default for StatusTicker {
    fn default() -> Self {
        Self::new(Self::PERIOD, Self::PULSE)
    }
}

impl Drop for StatusTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_is_disconnected() {
        let ticker = StatusTicker::default();
        assert_eq!(ticker.status(Instant::now()), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_pulse_window() {
        let t0 = Instant::now();
        let mut ticker = StatusTicker::default();
        ticker.start(t0);

        let at = |secs: f64| ticker.status(t0 + Duration::from_secs_f64(secs));
        assert_eq!(at(0.0), ConnectionStatus::Connected);
        assert_eq!(at(29.9), ConnectionStatus::Connected);
        assert_eq!(at(30.0), ConnectionStatus::Updating);
        assert_eq!(at(30.5), ConnectionStatus::Updating);
        assert_eq!(at(31.0), ConnectionStatus::Connected);
        assert_eq!(at(60.2), ConnectionStatus::Updating);
        assert_eq!(at(75.0), ConnectionStatus::Connected);
    }

    #[test]
    fn test_stop_then_restart() {
        let t0 = Instant::now();
        let mut ticker = StatusTicker::default();
        ticker.start(t0);
        ticker.stop();
        assert!(!ticker.is_running());
        assert_eq!(ticker.status(t0 + Duration::from_secs(30)), ConnectionStatus::Disconnected);

        let t1 = t0 + Duration::from_secs(100);
        ticker.start(t1);
        assert_eq!(ticker.status(t1 + Duration::from_secs(30)), ConnectionStatus::Updating);
    }
}
