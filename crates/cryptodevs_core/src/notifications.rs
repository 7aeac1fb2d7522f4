use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    Info,
    Success,
    Warning,
    Error,
}

/// A message the user has to acknowledge, the terminal counterpart of a
/// browser `alert()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub kind: AlertKind,
    pub message: String,
    pub read: bool,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            message: message.into(),
            read: false,
            timestamp: Utc::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(AlertKind::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(AlertKind::Warning, message)
    }
}

/// Where user-facing alerts go.
pub trait AlertSink: Send + Sync {
    fn alert(&self, alert: Alert);
}

/// In-memory alert store, newest first.
pub struct AlertLog {
    alerts: Mutex<Vec<Alert>>,
    max_alerts: usize,
}

impl AlertLog {
    pub fn new() -> Self {
        Self {
            alerts: Mutex::new(Vec::new()),
            max_alerts: 100,
        }
    }

    pub fn push(&self, alert: Alert) {
        let mut alerts = self.alerts.lock();
        alerts.insert(0, alert);
        alerts.truncate(self.max_alerts);
    }

    pub fn mark_all_read(&self) {
        for a in self.alerts.lock().iter_mut() {
            a.read = true;
        }
    }

    pub fn unread_count(&self) -> usize {
        self.alerts.lock().iter().filter(|a| !a.read).count()
    }

    /// Snapshot of all alerts, newest first.
    pub fn all(&self) -> Vec<Alert> {
        self.alerts.lock().clone()
    }

    /// Messages in the order they were raised.
    pub fn messages(&self) -> Vec<String> {
        self.alerts
            .lock()
            .iter()
            .rev()
            .map(|a| a.message.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.alerts.lock().clear();
    }
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertSink for AlertLog {
    fn alert(&self, alert: Alert) {
        self.push(alert);
    }
}
