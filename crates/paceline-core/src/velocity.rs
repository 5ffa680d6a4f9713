//! Recent-velocity estimation from a task's progress log.
//!
//! The estimator walks the log most-recent-first through a dual-bounded
//! trailing window: records count fully until BOTH an elapsed-work-time
//! floor and a work-day span floor are met, the record that crosses either
//! floor counts partially so the totals stop almost exactly at the floors,
//! and everything older is excluded. The elapsed floor guards against a
//! stale single burst (enough calendar span, too little active time); the
//! span floor guards against activity crammed into too little calendar
//! time.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::calendar::{as_hours, scale, WorkCalendar};
use crate::model::ProgressRecord;

/// Trailing-window floors for the estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityConfig {
    /// Minimum accumulated work time before the walk may stop.
    pub min_elapsed: Duration,
    /// Minimum accumulated work-day span before the walk may stop.
    pub min_dayspan: f64,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            min_elapsed: Duration::hours(6),
            min_dayspan: 4.0,
        }
    }
}

/// A smoothed recent velocity.
///
/// `rate` and `daily_work` are distinct measured quantities: how fast
/// progress accrues per hour actually worked, and how much work time a
/// work-day of calendar span typically yields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    /// Progress units per hour of logged work.
    pub rate: f64,
    /// Logged work time per work-day of calendar span.
    pub daily_work: Duration,
}

impl Velocity {
    /// The cold-start result: no usable signal in the window.
    pub fn zero() -> Self {
        Self {
            rate: 0.0,
            daily_work: Duration::zero(),
        }
    }
}

/// Estimates recent velocity over a work calendar.
#[derive(Debug, Clone)]
pub struct VelocityEstimator {
    calendar: WorkCalendar,
    config: VelocityConfig,
}

impl VelocityEstimator {
    /// Create an estimator with the default window floors.
    pub fn new(calendar: WorkCalendar) -> Self {
        Self {
            calendar,
            config: VelocityConfig::default(),
        }
    }

    /// Create an estimator with custom window floors.
    pub fn with_config(calendar: WorkCalendar, config: VelocityConfig) -> Self {
        Self { calendar, config }
    }

    /// Estimate from a chronological `log` as of `now`.
    ///
    /// A record states "after spending `spent`, progress reached
    /// `progress` at `at`", so each record's calendar span runs from the
    /// previous record to it; `task_start` stands in for the previous
    /// record of the oldest entry. The span since the latest record seeds
    /// the window, contributing zero progress.
    ///
    /// An empty log, a window with zero accumulated work time, or a
    /// degenerate non-positive calendar span all yield [`Velocity::zero`].
    pub fn estimate(
        &self,
        log: &[ProgressRecord],
        task_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Velocity {
        let Some(latest) = log.last() else {
            return Velocity::zero();
        };

        let mut total_elapsed = Duration::zero();
        let mut total_dayspan = self.calendar.workdays(latest.at, now);
        let mut total_progress = 0.0;

        for (i, record) in log.iter().enumerate().rev() {
            let add_progress = if i > 0 {
                record.progress - log[i - 1].progress
            } else {
                record.progress
            };
            let add_elapsed = record.spent;
            let prev_at = if i > 0 { log[i - 1].at } else { task_start };
            let add_dayspan = self.calendar.workdays(prev_at, record.at).max(0.0);

            let ratio =
                self.inclusion_ratio(total_elapsed, add_elapsed, total_dayspan, add_dayspan);
            total_elapsed += scale(add_elapsed, ratio);
            total_dayspan += add_dayspan * ratio;
            total_progress += add_progress * ratio;
            debug!(
                task = %record.task,
                ratio,
                total_dayspan,
                total_elapsed_min = total_elapsed.num_minutes(),
                "velocity window step"
            );
            if ratio < 1.0 {
                break;
            }
        }

        if total_elapsed <= Duration::zero() || total_dayspan <= 0.0 {
            return Velocity::zero();
        }
        Velocity {
            rate: total_progress / as_hours(total_elapsed),
            daily_work: scale(total_elapsed, 1.0 / total_dayspan),
        }
    }

    /// Fraction of a record to include so the totals stop at the floors.
    ///
    /// A floor that would be overshot contributes its linear crossing
    /// fraction; a floor not yet reached by full inclusion forces the
    /// record in whole. Any result below one ends the walk.
    fn inclusion_ratio(
        &self,
        total_elapsed: Duration,
        add_elapsed: Duration,
        total_dayspan: f64,
        add_dayspan: f64,
    ) -> f64 {
        let mut ratio: f64 = 0.0;
        if total_elapsed < self.config.min_elapsed {
            if total_elapsed + add_elapsed <= self.config.min_elapsed {
                ratio = 1.0;
            } else {
                let crossing = as_hours(self.config.min_elapsed - total_elapsed)
                    / as_hours(add_elapsed);
                ratio = ratio.max(crossing);
            }
        }
        if total_dayspan < self.config.min_dayspan {
            if total_dayspan + add_dayspan <= self.config.min_dayspan {
                ratio = 1.0;
            } else {
                let crossing = (self.config.min_dayspan - total_dayspan) / add_dayspan;
                ratio = ratio.max(crossing);
            }
        }
        ratio
    }
}
