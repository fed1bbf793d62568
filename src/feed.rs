use crate::registry::{standard_alerts, AlertRecord};
use crate::selection::{Selected, SelectionCoordinator};
use chrono::{DateTime, Utc};
use tracing::info;

/// Terminal rows taken by one alert card
pub const ALERT_ROW_HEIGHT: usize = 4;

/// Live alert list with a cursor
pub struct AlertFeed {
    alerts: Vec<AlertRecord>,
    cursor: usize,
    last_update: DateTime<Utc>,
}

impl AlertFeed {
    pub fn new(alerts: Vec<AlertRecord>, now: DateTime<Utc>) -> Self {
        Self {
            alerts,
            cursor: 0,
            last_update: now,
        }
    }

    /// Feed over the built-in snapshot
    pub fn standard(now: DateTime<Utc>) -> Self {
        Self::new(standard_alerts(now), now)
    }

    pub fn alerts(&self) -> &[AlertRecord] {
        &self.alerts
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    /// Re-snapshot the mock feed
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        self.alerts = standard_alerts(now);
        self.cursor = self.cursor.min(self.alerts.len().saturating_sub(1));
        self.last_update = now;
        info!(count = self.alerts.len(), "alert feed refreshed");
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if self.alerts.is_empty() {
            self.cursor = 0;
            return;
        }
        let target = self.cursor as isize + delta;
        self.cursor = target.clamp(0, self.alerts.len() as isize - 1) as usize;
    }

    pub fn select_at_cursor(&self, coordinator: &mut SelectionCoordinator) {
        if let Some(alert) = self.alerts.get(self.cursor) {
            coordinator.select(Selected::Alert(alert.clone()));
        }
    }

    /// First visible alert for a pane `height` rows tall
    pub fn scroll_offset(&self, height: usize) -> usize {
        let visible = (height / ALERT_ROW_HEIGHT).max(1);
        (self.cursor + 1).saturating_sub(visible)
    }

    /// Select the alert under pane-relative `row`
    pub fn click(&mut self, row: usize, height: usize, coordinator: &mut SelectionCoordinator) -> bool {
        let idx = self.scroll_offset(height) + row / ALERT_ROW_HEIGHT;
        if idx >= self.alerts.len() {
            return false;
        }
        self.cursor = idx;
        self.select_at_cursor(coordinator);
        true
    }
}

/// "5m ago" under an hour, whole hours after that
pub fn format_time_ago(occurred_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(occurred_at);
    let minutes = diff.num_minutes().max(0);
    if minutes < 60 {
        format!("{minutes}m ago")
    } else {
        format!("{}h ago", minutes / 60)
    }
}
