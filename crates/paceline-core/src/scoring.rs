//! Point scoring for tasks.
//!
//! Each task earns a point score from its progress and velocity: roughly,
//! one point per hundredth of a work-day ahead of schedule. Ahead-of-
//! schedule gaps are judged against a fixed ideal-day budget rather than
//! the task's observed throughput, so resting after finishing early cannot
//! inflate the score; behind-schedule gaps use the real throughput to
//! judge how far behind the task actually is.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{as_hours, scale, WorkCalendar};
use crate::model::{duration_seconds, LongTask, ProgressRecord, ShortTask};
use crate::preference::is_disabled;
use crate::state::State;
use crate::velocity::{Velocity, VelocityConfig, VelocityEstimator};

/// Scoring constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Ideal focused work per day, used to translate an ahead-of-schedule
    /// gap into points.
    pub daily_budget: Duration,
    /// Velocity window floors.
    pub velocity: VelocityConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            // 8h at an 80% work-to-break ratio.
            daily_budget: Duration::minutes(390),
            velocity: VelocityConfig::default(),
        }
    }
}

/// Derived stats for one long task at an evaluation instant.
///
/// Recomputed on every evaluation, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongTaskStats {
    /// Work time still needed to reach the required total at the current
    /// rate.
    #[serde(with = "duration_seconds")]
    pub required: Duration,
    /// Work time available before the deadline at the current throughput.
    #[serde(with = "duration_seconds")]
    pub available: Duration,
    pub deadline: DateTime<Utc>,
    pub latest_start: DateTime<Utc>,
    pub points: i64,
    /// Total logged work time.
    #[serde(with = "duration_seconds")]
    pub spent: Duration,
    /// Cumulative progress.
    pub progress: f64,
    /// Progress units per hour, recent window.
    pub rate: f64,
    /// Logged work per work-day, recent window.
    #[serde(with = "duration_seconds")]
    pub daily_work: Duration,
}

impl LongTaskStats {
    /// The no-history stats for a task absent from a snapshot.
    pub fn empty(task: &LongTask) -> Self {
        Self {
            required: Duration::zero(),
            available: Duration::zero(),
            deadline: task.deadline,
            latest_start: task.latest_start,
            points: 0,
            spent: Duration::zero(),
            progress: 0.0,
            rate: 0.0,
            daily_work: Duration::zero(),
        }
    }
}

/// Derived stats for one short task at an evaluation instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortTaskStats {
    /// Estimated work remaining; zero once completed.
    #[serde(with = "duration_seconds")]
    pub required: Duration,
    /// Calendar work capacity left before the deadline.
    #[serde(with = "duration_seconds")]
    pub available: Duration,
    pub deadline: DateTime<Utc>,
    pub earliest_start: DateTime<Utc>,
    pub points: i64,
    /// Actual work time, when recorded.
    #[serde(with = "duration_seconds")]
    pub spent: Duration,
    pub completed: bool,
}

impl ShortTaskStats {
    /// The no-history stats for a task absent from a snapshot.
    pub fn empty(task: &ShortTask) -> Self {
        Self {
            required: task.estimate,
            available: Duration::zero(),
            deadline: task.deadline,
            earliest_start: task.earliest_start,
            points: 0,
            spent: Duration::zero(),
            completed: false,
        }
    }
}

/// Aggregate evaluation of a state at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateStats {
    /// Sum of every task's points.
    pub total_points: i64,
    pub long_points: i64,
    pub short_points: i64,
    pub long: BTreeMap<String, LongTaskStats>,
    pub short: BTreeMap<String, ShortTaskStats>,
    /// Recent work time per work-day across every enabled long task
    /// combined.
    #[serde(with = "duration_seconds")]
    pub daily_average: Duration,
}

/// Converts progress and velocity into point scores.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    calendar: WorkCalendar,
    config: ScoringConfig,
}

impl ScoringEngine {
    /// Create an engine with the default constants.
    pub fn new(calendar: WorkCalendar) -> Self {
        Self {
            calendar,
            config: ScoringConfig::default(),
        }
    }

    /// Create an engine with custom constants.
    pub fn with_config(calendar: WorkCalendar, config: ScoringConfig) -> Self {
        Self { calendar, config }
    }

    /// Evaluate every enabled task in `state` as of `now`.
    ///
    /// Progress entries naming tasks no longer present in the snapshot are
    /// ignored; the append-only log may reference since-deleted tasks.
    pub fn evaluate(&self, state: &State, now: DateTime<Utc>) -> StateStats {
        let estimator =
            VelocityEstimator::with_config(self.calendar.clone(), self.config.velocity);

        let mut long = BTreeMap::new();
        let mut long_points = 0;
        let mut merged: Vec<ProgressRecord> = Vec::new();
        for task in state.long_tasks.values() {
            if is_disabled(&task.name, &state.preferences) {
                continue;
            }
            let log = state
                .progress
                .get(&task.name)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let stats = self.long_task_stats(task, log, &estimator, now);
            merged.extend_from_slice(log);
            long_points += stats.points;
            long.insert(task.name.clone(), stats);
        }

        let mut short = BTreeMap::new();
        let mut short_points = 0;
        for task in state.short_tasks.values() {
            if is_disabled(&task.name, &state.preferences) {
                continue;
            }
            let stats = self.short_task_stats(task, now);
            short_points += stats.points;
            short.insert(task.name.clone(), stats);
        }

        // The combined daily average falls out of one merged chronological
        // log; only the throughput half of that estimate is meaningful.
        let mut daily_average = Duration::zero();
        if !merged.is_empty() {
            merged.sort_by_key(|record| record.at);
            let begin = merged[0].at;
            daily_average = estimator.estimate(&merged, begin, now).daily_work;
        }

        StateStats {
            total_points: long_points + short_points,
            long_points,
            short_points,
            long,
            short,
            daily_average,
        }
    }

    fn long_task_stats(
        &self,
        task: &LongTask,
        log: &[ProgressRecord],
        estimator: &VelocityEstimator,
        now: DateTime<Utc>,
    ) -> LongTaskStats {
        let mut progress = 0.0;
        let mut spent = Duration::zero();
        let mut velocity = Velocity::zero();
        if let Some(latest) = log.last() {
            progress = latest.progress;
            spent = log
                .iter()
                .fold(Duration::zero(), |total, record| total + record.spent);
            velocity = estimator.estimate(log, task.latest_start, now);
        }

        let mut available = scale(velocity.daily_work, self.calendar.workdays(now, task.deadline));
        if available < Duration::zero() {
            available = Duration::zero();
        }
        // No rate signal means no basis to diverge: treated as exactly on
        // pace.
        let mut required = available;
        if velocity.rate != 0.0 {
            required = scale(
                Duration::hours(1),
                (task.required_total - progress) / velocity.rate,
            );
        }

        let points = self.long_task_points(task, progress, required, available, &velocity, now);
        LongTaskStats {
            required,
            available,
            deadline: task.deadline,
            latest_start: task.latest_start,
            points,
            spent,
            progress,
            rate: velocity.rate,
            daily_work: velocity.daily_work,
        }
    }

    fn long_task_points(
        &self,
        task: &LongTask,
        progress: f64,
        required: Duration,
        available: Duration,
        velocity: &Velocity,
        now: DateTime<Utc>,
    ) -> i64 {
        if progress >= task.required_total {
            // Finished: bonus from the slack left before the deadline.
            if now < task.deadline {
                return round_points(self.calendar.workdays(now, task.deadline) * 100.0);
            }
            return 0;
        }
        if progress > 0.0 {
            let gap = available - required;
            return if gap > Duration::zero() {
                round_points(as_hours(gap) / as_hours(self.config.daily_budget) * 100.0)
            } else if velocity.daily_work > Duration::zero() {
                round_points(as_hours(gap) / as_hours(velocity.daily_work) * 100.0)
            } else {
                0
            };
        }
        if now > task.latest_start {
            // Start-delay penalty; the span looking back is negative.
            return round_points(self.calendar.workdays(now, task.latest_start) * 100.0);
        }
        0
    }

    fn short_task_stats(&self, task: &ShortTask, now: DateTime<Utc>) -> ShortTaskStats {
        let completed = task.completed_at.map(|done| done <= now).unwrap_or(false);
        let required = if completed {
            Duration::zero()
        } else {
            task.estimate
        };
        let available = scale(
            self.calendar.day_total(),
            self.calendar.workdays(now, task.deadline).max(0.0),
        );
        let points = if completed {
            100
        } else {
            let into = self.calendar.workdays(task.earliest_start, now);
            let span = self.calendar.workdays(task.earliest_start, task.deadline);
            if into <= 0.0 || span <= 0.0 {
                0
            } else {
                // Penalty ramps from zero at the earliest start to -100 at
                // the deadline, and keeps sinking past it.
                -round_points(into / span * 100.0)
            }
        };
        ShortTaskStats {
            required,
            available,
            deadline: task.deadline,
            earliest_start: task.earliest_start,
            points,
            spent: task.actual.unwrap_or_else(Duration::zero),
            completed,
        }
    }
}

/// Round half up, matching the original scoreboard.
fn round_points(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
