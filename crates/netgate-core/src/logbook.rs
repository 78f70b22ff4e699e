// ── In-memory log books ──
//
// Request log, blocked-packet log and alert list, each a bounded ring
// buffer. Recording a blocked packet also runs the drop-rate alarm.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::AlarmConfig;
use crate::model::{BlockedPacket, LogEntry, LogLevel, LogQuery, RequestRecord};

struct Ring<T> {
    items: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T: Clone> Ring<T> {
    fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, item: T) {
        let mut items = self.lock();
        if items.len() == self.capacity {
            items.pop_front();
        }
        items.push_back(item);
    }

    fn oldest_first(&self, filter: impl Fn(&T) -> bool) -> Vec<T> {
        self.lock().iter().filter(|t| filter(t)).cloned().collect()
    }

    fn newest_first(&self) -> Vec<T> {
        self.lock().iter().rev().cloned().collect()
    }
}

/// All gateway log records.
pub struct LogBook {
    entries: Ring<LogEntry>,
    blocked: Ring<BlockedPacket>,
    alerts: Ring<LogEntry>,
    alarm: AlarmConfig,
    last_alarm: Mutex<Option<DateTime<Utc>>>,
}

impl LogBook {
    pub fn new(capacity: usize, alarm: AlarmConfig) -> Self {
        Self {
            entries: Ring::new(capacity),
            blocked: Ring::new(capacity),
            alerts: Ring::new(capacity),
            alarm,
            last_alarm: Mutex::new(None),
        }
    }

    pub fn record(&self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn record_request(&self, request: RequestRecord) {
        self.record(LogEntry::from(request));
    }

    /// Store a dropped-packet line and raise an alert if the drop rate
    /// crossed the alarm threshold. Returns the alert, if one was raised.
    pub fn record_blocked(&self, raw_log_line: &str, at: DateTime<Utc>) -> Option<LogEntry> {
        self.blocked.push(BlockedPacket {
            timestamp: at,
            raw_log_line: raw_log_line.trim().to_owned(),
        });
        self.check_alarm(at)
    }

    /// Request log in arrival order, filtered by `query`.
    pub fn entries(&self, query: &LogQuery) -> Vec<LogEntry> {
        self.entries.oldest_first(|e| query.matches(e))
    }

    /// Blocked packets, newest first.
    pub fn blocked(&self) -> Vec<BlockedPacket> {
        self.blocked.newest_first()
    }

    /// Alerts, newest first.
    pub fn alerts(&self) -> Vec<LogEntry> {
        self.alerts.newest_first()
    }

    fn check_alarm(&self, now: DateTime<Utc>) -> Option<LogEntry> {
        let cutoff = now - self.alarm.window;
        let recent = self
            .blocked
            .lock()
            .iter()
            .filter(|p| p.timestamp >= cutoff)
            .count();
        if recent <= self.alarm.threshold {
            return None;
        }

        let mut last = self
            .last_alarm
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if last.is_some_and(|at| now - at < self.alarm.window) {
            return None;
        }
        *last = Some(now);

        let minutes = self.alarm.window.num_minutes();
        let mut alert = LogEntry::new(
            LogLevel::Alert,
            format!("{recent} dropped packets in the last {minutes} minutes"),
        );
        alert.timestamp = now;
        warn!(dropped = recent, window_minutes = minutes, "drop-rate alarm raised");

        self.entries.push(alert.clone());
        self.alerts.push(alert.clone());
        Some(alert)
    }
}
