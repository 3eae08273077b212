//! Structured weekly opening hours.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Minutes in a day; a range closing at this value closes at midnight.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// An open interval in minutes since local midnight, `open < close <= 1440`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub open_minute: u16,
    pub close_minute: u16,
}

impl TimeRange {
    #[must_use]
    pub fn new(open_minute: u16, close_minute: u16) -> Option<Self> {
        (open_minute < close_minute && close_minute <= MINUTES_PER_DAY).then_some(Self {
            open_minute,
            close_minute,
        })
    }

    #[must_use]
    pub fn all_day() -> Self {
        Self {
            open_minute: 0,
            close_minute: MINUTES_PER_DAY,
        }
    }

    #[must_use]
    pub fn contains(&self, minute: u16) -> bool {
        minute >= self.open_minute && minute < self.close_minute
    }
}

/// Open intervals for a single weekday. No intervals means closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub intervals: Vec<TimeRange>,
}

impl DaySchedule {
    #[must_use]
    pub fn closed() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Per-weekday schedule, Monday first. Days without data are closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    days: [DaySchedule; 7],
    /// `false` when the source carried no opening-hours information at all.
    known: bool,
}

impl OpeningHours {
    /// Schedule with no information: every day reports closed.
    #[must_use]
    pub fn unknown() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn always_open() -> Self {
        let mut hours = Self {
            known: true,
            ..Self::default()
        };
        for day in &mut hours.days {
            day.intervals.push(TimeRange::all_day());
        }
        hours
    }

    /// Builds a schedule from explicit per-day intervals.
    #[must_use]
    pub fn from_days(days: [DaySchedule; 7]) -> Self {
        Self { days, known: true }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        self.known
    }

    #[must_use]
    pub fn day(&self, weekday: Weekday) -> &DaySchedule {
        &self.days[weekday.num_days_from_monday() as usize]
    }

    pub fn day_mut(&mut self, weekday: Weekday) -> &mut DaySchedule {
        self.known = true;
        &mut self.days[weekday.num_days_from_monday() as usize]
    }

    #[must_use]
    pub fn is_open_at(&self, weekday: Weekday, minute: u16) -> bool {
        self.day(weekday).intervals.iter().any(|r| r.contains(minute))
    }

    #[must_use]
    pub fn is_always_open(&self) -> bool {
        self.days
            .iter()
            .all(|d| d.intervals.iter().any(|r| *r == TimeRange::all_day()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_schedule_is_closed_every_day() {
        let hours = OpeningHours::unknown();
        assert!(!hours.is_known());
        assert!(hours.day(Weekday::Wed).is_closed());
        assert!(!hours.is_open_at(Weekday::Mon, 600));
    }

    #[test]
    fn always_open_covers_midnight_and_late_evening() {
        let hours = OpeningHours::always_open();
        assert!(hours.is_always_open());
        assert!(hours.is_open_at(Weekday::Sun, 0));
        assert!(hours.is_open_at(Weekday::Sun, 1439));
    }

    #[test]
    fn time_range_rejects_inverted_bounds() {
        assert!(TimeRange::new(600, 540).is_none());
        assert!(TimeRange::new(600, 600).is_none());
        assert!(TimeRange::new(0, MINUTES_PER_DAY + 1).is_none());
        assert!(TimeRange::new(480, 1020).is_some());
    }

    #[test]
    fn close_minute_is_exclusive() {
        let range = TimeRange::new(480, 1020).unwrap();
        assert!(range.contains(480));
        assert!(!range.contains(1020));
    }
}
