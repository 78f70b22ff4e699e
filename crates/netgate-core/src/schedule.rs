// ── Schedule evaluation ──
//
// A rule may restrict itself to a local time-of-day window on selected
// weekdays. Windows are half-open: the start minute is inside, the end
// minute is not. Windows never cross midnight; the rule builder rejects
// them. An end of `24:00` covers the last minute of the day.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::model::{ClockTime, DaySet, Rule};

/// The time window a scheduled rule is active in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub start: ClockTime,
    pub end: ClockTime,
    pub days: DaySet,
}

impl ScheduleWindow {
    /// Extract the window from a rule, if it has one.
    pub fn of(rule: &Rule) -> Option<Self> {
        match (rule.schedule_start, rule.schedule_end) {
            (Some(start), Some(end)) => Some(Self {
                start,
                end,
                days: rule.days_of_week,
            }),
            _ => None,
        }
    }

    pub fn contains(&self, now: NaiveDateTime) -> bool {
        let secs = now.time().num_seconds_from_midnight();
        let in_hours = self.start.seconds_from_midnight() <= secs
            && secs < self.end.seconds_from_midnight();
        let on_day = self.days.is_empty() || self.days.contains(now.weekday());
        in_hours && on_day
    }
}

/// Whether `rule` takes part in evaluation at local time `now`.
///
/// Rules without a window are always active. Days configured without a
/// time window have no effect.
pub fn is_active(rule: &Rule, now: NaiveDateTime) -> bool {
    ScheduleWindow::of(rule).is_none_or(|w| w.contains(now))
}
