//! Recurring work-window calendar and work-day arithmetic.
//!
//! A "work-day" is one full pass through the configured daily windows, so
//! off-hours never count toward a day's work: with 3 hours logged against a
//! 6-hour calendar, half a work-day has passed. Spans between instants are
//! measured as fractional work-days under the assumption that the same
//! windows repeat every calendar day (no weekday or holiday variation).

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// One recurring daily work window.
///
/// `end <= start` wraps past midnight: the window runs from `start` on its
/// anchor date to `end` on the following day, so `start == end` is a full
/// 24-hour window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl WorkWindow {
    /// Concrete bounds of this window anchored to `t`'s calendar date.
    fn anchored(&self, t: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let begin = t.date_naive().and_time(self.start).and_utc();
        let mut end = t.date_naive().and_time(self.end).and_utc();
        if end <= begin {
            end += Duration::days(1);
        }
        (begin, end)
    }

    /// Configured duration of one pass through this window.
    pub fn duration(&self) -> Duration {
        // The anchor date is irrelevant; any date yields the same span.
        let (begin, end) = self.anchored(DateTime::<Utc>::UNIX_EPOCH);
        end - begin
    }
}

/// Recurring daily work calendar: an ordered list of [`WorkWindow`]s.
///
/// Windows may overlap; overlap is not validated and simply counts double.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    windows: Vec<WorkWindow>,
}

impl WorkCalendar {
    /// Build a calendar from its daily windows.
    ///
    /// The summed window duration must be strictly positive: a calendar
    /// with no working time makes every work-day span a division by zero,
    /// so it is rejected here instead of defaulted.
    pub fn new(windows: Vec<WorkWindow>) -> Result<Self, CalendarError> {
        let calendar = Self { windows };
        if calendar.day_total() <= Duration::zero() {
            return Err(CalendarError::EmptyWorkday);
        }
        Ok(calendar)
    }

    /// The configured windows, in their original order.
    pub fn windows(&self) -> &[WorkWindow] {
        &self.windows
    }

    /// Work time elapsed on `t`'s calendar date at or before `t`.
    ///
    /// Sums, over every window anchored to `t`'s date, the portion of that
    /// window lying at or before `t`. The early-morning tail of a wrapped
    /// window is attributed to its anchor date, not the date it spills into.
    pub fn workday_time(&self, t: DateTime<Utc>) -> Duration {
        let mut total = Duration::zero();
        for window in &self.windows {
            let (begin, end) = window.anchored(t);
            if t < begin {
                continue;
            }
            total += if t < end { t - begin } else { end - begin };
        }
        total
    }

    /// Total configured work duration in one full day.
    pub fn day_total(&self) -> Duration {
        self.windows
            .iter()
            .fold(Duration::zero(), |total, window| total + window.duration())
    }

    /// Fractional work-days between `begin` and `end`.
    ///
    /// Fixed-point decomposition: whole-date difference plus the in-day
    /// work-time difference over the daily total. This avoids branching on
    /// whether either instant falls inside a window. Negative when
    /// `end < begin`; exactly zero when the instants coincide.
    pub fn workdays(&self, begin: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        let date_diff = (end.date_naive() - begin.date_naive()).num_days() as f64;
        let time_diff = as_hours(self.workday_time(end) - self.workday_time(begin))
            / as_hours(self.day_total());
        date_diff + time_diff
    }
}

/// Span in fractional hours.
pub(crate) fn as_hours(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 3_600_000.0
}

/// Scale a span by a dimensionless factor.
pub(crate) fn scale(duration: Duration, factor: f64) -> Duration {
    Duration::milliseconds((duration.num_milliseconds() as f64 * factor).round() as i64)
}
