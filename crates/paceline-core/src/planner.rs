//! Deadline-aware allocation planning.
//!
//! The planner finds the minimum feasible uniform work rate across all
//! competitive tasks: for every prefix of the ascending-deadline order, the
//! average daily rate needed to finish everything due by that deadline
//! under perfectly smooth pacing. The maximizing prefix is the critical
//! point, and the period's budget is split proportionally across it. Once
//! the tightest deadline has already passed, a structurally different walk
//! takes over and allocates overdue work in full; the two walks live in
//! separate functions behind a thin dispatcher because their guarantees
//! differ.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{as_hours, scale, WorkCalendar};
use crate::model::{duration_seconds, duration_seconds_map};
use crate::preference::is_disabled;
use crate::scoring::{LongTaskStats, ShortTaskStats, StateStats};
use crate::state::State;

/// Planner constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerConfig {
    /// Placeholder remaining work for a long task with no usable rate yet.
    pub cold_start_estimate: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            cold_start_estimate: Duration::minutes(20),
        }
    }
}

/// One evaluated snapshot handed to the planner.
#[derive(Debug, Clone, Copy)]
pub struct Evaluation<'a> {
    pub time: DateTime<Utc>,
    pub state: &'a State,
    pub stats: &'a StateStats,
}

/// Recommended overall pace for the period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "per_day")]
pub enum Pace {
    /// Work per work-day that keeps every deadline reachable.
    PerDay(#[serde(with = "duration_seconds")] Duration),
    /// The tightest deadline has already passed; no finite pace suffices.
    Overdue,
}

/// A period allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Recommended work time per task for the period.
    #[serde(with = "duration_seconds_map")]
    pub allocations: BTreeMap<String, Duration>,
    /// Overall recommended pace for the competitive tasks.
    pub pace: Pace,
    /// The deadline that forces the pace.
    pub critical_deadline: DateTime<Utc>,
    /// Work volume due by the critical deadline.
    #[serde(with = "duration_seconds")]
    pub critical_work: Duration,
    /// Total reserved for keep-schedule tasks this period.
    #[serde(with = "duration_seconds")]
    pub keep_total: Duration,
}

impl Plan {
    /// Recommended total for the period: the competitive per-day pace plus
    /// the keep-schedule reserve. Undefined while overdue.
    pub fn total_recommended(&self) -> Option<Duration> {
        match self.pace {
            Pace::PerDay(per_day) => Some(per_day + self.keep_total),
            Pace::Overdue => None,
        }
    }
}

/// One candidate row in the allocation walk.
#[derive(Debug, Clone)]
struct TaskItem {
    name: String,
    /// Remaining work to finish the task.
    work: Duration,
    deadline: DateTime<Utc>,
    keep: bool,
    /// Not startable this period; contributes deadline pressure but
    /// receives nothing.
    skipped: bool,
}

/// Computes per-task time allocations for an upcoming period.
#[derive(Debug, Clone)]
pub struct AllocationPlanner {
    calendar: WorkCalendar,
    config: PlannerConfig,
}

impl AllocationPlanner {
    /// Create a planner with the default constants.
    pub fn new(calendar: WorkCalendar) -> Self {
        Self {
            calendar,
            config: PlannerConfig::default(),
        }
    }

    /// Create a planner with custom constants.
    pub fn with_config(calendar: WorkCalendar, config: PlannerConfig) -> Self {
        Self { calendar, config }
    }

    /// Plan the period from `baseline.time` to `horizon`.
    ///
    /// `current` supplies up-to-date rates and progress; `baseline` anchors
    /// the period and the remaining-work amounts, so a mid-period replan
    /// keeps a stable frame of reference. `horizon` must lie after the
    /// baseline instant.
    pub fn plan(
        &self,
        current: &Evaluation<'_>,
        baseline: &Evaluation<'_>,
        horizon: DateTime<Utc>,
    ) -> Plan {
        let mut items = self.collect(current, baseline, horizon);
        // Stable: equal deadlines keep insertion order (long before short).
        items.sort_by_key(|item| item.deadline);

        let period_span = self.calendar.workdays(baseline.time, horizon);
        let mut allocations = BTreeMap::new();
        let mut keep_total = Duration::zero();
        let mut competitive = Vec::new();
        for item in items {
            if item.keep {
                let share = self.keep_share(&item, baseline.time, horizon, period_span);
                keep_total += share;
                allocations.insert(item.name.clone(), share);
            } else {
                competitive.push(item);
            }
        }

        let overdue = competitive
            .first()
            .is_some_and(|first| self.calendar.workdays(baseline.time, first.deadline) <= 0.0);
        if overdue {
            self.allocate_overdue(&competitive, baseline.time, allocations, keep_total)
        } else {
            self.allocate_steady(
                &competitive,
                baseline.time,
                horizon,
                period_span,
                allocations,
                keep_total,
            )
        }
    }

    /// Gather keep/competitive candidates from the two snapshots.
    fn collect(
        &self,
        current: &Evaluation<'_>,
        baseline: &Evaluation<'_>,
        horizon: DateTime<Utc>,
    ) -> Vec<TaskItem> {
        let mut items = Vec::new();
        for task in current.state.long_tasks.values() {
            if is_disabled(&task.name, &current.state.preferences) {
                continue;
            }
            let Some(stats) = current.stats.long.get(&task.name) else {
                continue;
            };
            let baseline_stats = baseline
                .stats
                .long
                .get(&task.name)
                .cloned()
                .unwrap_or_else(|| LongTaskStats::empty(task));
            if baseline_stats.progress >= task.required_total {
                // Already done at the baseline.
                continue;
            }
            let work = if stats.progress > 0.0 && stats.rate > 0.0 {
                scale(
                    Duration::hours(1),
                    (task.required_total - baseline_stats.progress) / stats.rate,
                )
            } else {
                self.config.cold_start_estimate
            };
            // An unstarted task is pressed by its latest start, not its
            // deadline.
            let deadline = if stats.progress > 0.0 {
                task.deadline
            } else {
                task.latest_start
            };
            items.push(TaskItem {
                name: task.name.clone(),
                work,
                deadline,
                keep: task.keep_schedule,
                skipped: false,
            });
        }
        for task in current.state.short_tasks.values() {
            if is_disabled(&task.name, &current.state.preferences) {
                continue;
            }
            if task
                .completed_at
                .is_some_and(|done| baseline.time >= done)
            {
                continue;
            }
            if task.estimate <= Duration::zero() {
                continue;
            }
            let skipped = self.calendar.workdays(horizon, task.earliest_start) >= 0.0;
            if skipped {
                debug!(task = %task.name, "earliest start beyond horizon; deferred");
            }
            let baseline_stats = baseline
                .stats
                .short
                .get(&task.name)
                .cloned()
                .unwrap_or_else(|| ShortTaskStats::empty(task));
            items.push(TaskItem {
                name: task.name.clone(),
                work: baseline_stats.required,
                deadline: task.deadline,
                keep: false,
                skipped,
            });
        }
        items
    }

    /// A keep-schedule task's remaining work, spread over its own remaining
    /// life and capped at the full amount.
    fn keep_share(
        &self,
        item: &TaskItem,
        base: DateTime<Utc>,
        horizon: DateTime<Utc>,
        period_span: f64,
    ) -> Duration {
        if item.deadline < horizon {
            return item.work;
        }
        let life = self.calendar.workdays(base, item.deadline);
        if life <= 0.0 {
            return item.work;
        }
        scale(item.work, (period_span / life).min(1.0))
    }

    /// Critical-point allocation: locate the ascending-deadline prefix that
    /// maximizes required density, then split the period budget across it
    /// proportionally to each task's slice of the critical workload.
    fn allocate_steady(
        &self,
        competitive: &[TaskItem],
        base: DateTime<Utc>,
        horizon: DateTime<Utc>,
        period_span: f64,
        mut allocations: BTreeMap<String, Duration>,
        keep_total: Duration,
    ) -> Plan {
        let mut total_work = Duration::zero();
        let mut pace = Duration::zero();
        let mut critical_len = 0;
        let mut critical_deadline = base;
        let mut critical_work = Duration::zero();
        let mut critical_span = 0.0;
        for (i, item) in competitive.iter().enumerate() {
            let effective_end = item.deadline.max(horizon);
            total_work += item.work;
            let span = self.calendar.workdays(base, effective_end);
            let density = scale(total_work, 1.0 / span);
            if density > pace {
                critical_len = i + 1;
                pace = density;
                critical_deadline = effective_end;
                critical_work = total_work;
                critical_span = span;
            }
        }

        let period_quota = scale(pace, period_span);
        let mut period_alloc = Duration::zero();
        let mut allocated = Duration::zero();
        for item in &competitive[..critical_len] {
            let effective_end = item.deadline.max(horizon);
            // Work due by this task's deadline under the critical pace.
            let quota = scale(
                critical_work,
                self.calendar.workdays(base, effective_end) / critical_span,
            );
            let slice = quota - allocated;
            debug!(
                task = %item.name,
                work_min = item.work.num_minutes(),
                slice_min = slice.num_minutes(),
                "allocation step"
            );
            if slice <= Duration::zero() || period_alloc > period_quota {
                // Rounding already exhausted this slice; skip the split.
                continue;
            }
            let mut share = scale(
                period_quota - period_alloc,
                as_hours(item.work) / as_hours(slice),
            );
            if share > item.work {
                share = item.work;
            }
            allocated += item.work;
            if item.skipped {
                share = Duration::zero();
            }
            allocations.insert(item.name.clone(), share);
            period_alloc += share;
        }

        Plan {
            allocations,
            pace: Pace::PerDay(pace),
            critical_deadline,
            critical_work,
            keep_total,
        }
    }

    /// Overdue walk: every task whose deadline span is already spent gets
    /// its entire remaining work immediately; no proportional spreading.
    fn allocate_overdue(
        &self,
        competitive: &[TaskItem],
        base: DateTime<Utc>,
        mut allocations: BTreeMap<String, Duration>,
        keep_total: Duration,
    ) -> Plan {
        let critical_deadline = competitive
            .first()
            .map(|item| item.deadline)
            .unwrap_or(base);
        let mut critical_work = Duration::zero();
        for item in competitive {
            if self.calendar.workdays(base, item.deadline) > 0.0 {
                // Sorted ascending: everything further out still has runway.
                break;
            }
            debug!(task = %item.name, work_min = item.work.num_minutes(), "overdue allocation");
            allocations.insert(item.name.clone(), item.work);
            critical_work += item.work;
        }
        Plan {
            allocations,
            pace: Pace::Overdue,
            critical_deadline,
            critical_work,
            keep_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WorkWindow;
    use crate::model::{LongTask, ProgressRecord, ShortTask};
    use crate::scoring::ScoringEngine;
    use crate::state::{collect_state, EventLog};
    use chrono::{NaiveTime, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, day, hour, 0, 0).unwrap()
    }

    fn base_log() -> EventLog {
        EventLog {
            worktime: vec![WorkWindow {
                start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            }],
            ..EventLog::default()
        }
    }

    fn short_task(name: &str, deadline: DateTime<Utc>, estimate: Duration) -> ShortTask {
        ShortTask {
            name: name.to_string(),
            title: name.to_uppercase(),
            recorded_at: at(1, 8),
            deadline,
            earliest_start: at(1, 9),
            estimate,
            completed_at: None,
            actual: None,
        }
    }

    /// Evaluate the log at one instant and plan with identical current and
    /// baseline snapshots.
    fn plan_at(log: &EventLog, now: DateTime<Utc>, horizon: DateTime<Utc>) -> Plan {
        let state = collect_state(log, now).unwrap();
        let stats = ScoringEngine::new(state.calendar.clone()).evaluate(&state, now);
        let evaluation = Evaluation {
            time: now,
            state: &state,
            stats: &stats,
        };
        AllocationPlanner::new(state.calendar.clone()).plan(&evaluation, &evaluation, horizon)
    }

    #[test]
    fn test_empty_task_set_yields_zero_plan() {
        let log = base_log();
        let plan = plan_at(&log, at(1, 9), at(2, 9));
        assert!(plan.allocations.is_empty());
        assert_eq!(plan.pace, Pace::PerDay(Duration::zero()));
        assert_eq!(plan.critical_work, Duration::zero());
        assert_eq!(plan.keep_total, Duration::zero());
        assert_eq!(plan.total_recommended(), Some(Duration::zero()));
    }

    #[test]
    fn test_single_task_full_capacity() {
        // 40h due five work-days out on an 8h/day calendar, evaluated at a
        // window boundary: required pace is the whole day, and a one-day
        // horizon allocates exactly one day's capacity.
        let mut log = base_log();
        log.short_tasks = vec![short_task("a", at(6, 9), Duration::hours(40))];
        let now = at(1, 9);

        let plan = plan_at(&log, now, at(2, 9));
        assert_eq!(plan.pace, Pace::PerDay(Duration::hours(8)));
        assert_eq!(plan.allocations["a"], Duration::hours(8));
        assert_eq!(plan.critical_deadline, at(6, 9));
        assert_eq!(plan.critical_work, Duration::hours(40));
    }

    #[test]
    fn test_single_task_horizon_at_deadline_allocates_everything() {
        let mut log = base_log();
        log.short_tasks = vec![short_task("a", at(6, 9), Duration::hours(40))];

        let plan = plan_at(&log, at(1, 9), at(6, 9));
        assert_eq!(plan.pace, Pace::PerDay(Duration::hours(8)));
        assert_eq!(plan.allocations["a"], Duration::hours(40));
        assert_eq!(plan.total_recommended(), Some(Duration::hours(8)));
    }

    #[test]
    fn test_equal_deadlines_split_proportionally() {
        // Two 4h tasks due two work-days out, one-day horizon: the period
        // gets W * period/total = 4h, split across both, and neither share
        // exceeds its own remaining work.
        let mut log = base_log();
        log.short_tasks = vec![
            short_task("a", at(3, 9), Duration::hours(4)),
            short_task("b", at(3, 9), Duration::hours(4)),
        ];

        let plan = plan_at(&log, at(1, 9), at(2, 9));
        assert_eq!(plan.pace, Pace::PerDay(Duration::hours(4)));
        assert_eq!(plan.allocations["a"], Duration::hours(2));
        assert_eq!(plan.allocations["b"], Duration::hours(2));
        assert_eq!(plan.critical_work, Duration::hours(8));
    }

    #[test]
    fn test_critical_point_checked_at_every_prefix() {
        // A: 4h due two work-days out (density 2h/day). B: 4h due ten out
        // (combined density 0.8h/day). The maximum is at A alone, so B sits
        // outside the critical prefix and receives nothing this period.
        let mut log = base_log();
        log.short_tasks = vec![
            short_task("a", at(3, 9), Duration::hours(4)),
            short_task("b", at(11, 9), Duration::hours(4)),
        ];

        let plan = plan_at(&log, at(1, 9), at(2, 9));
        assert_eq!(plan.pace, Pace::PerDay(Duration::hours(2)));
        assert_eq!(plan.critical_deadline, at(3, 9));
        assert_eq!(plan.critical_work, Duration::hours(4));
        assert_eq!(plan.allocations["a"], Duration::hours(2));
        assert!(!plan.allocations.contains_key("b"));
    }

    #[test]
    fn test_later_prefix_can_dominate() {
        // A alone: 2h over 2 days = 1h/day. A+B: 18h over 3 days = 6h/day.
        // The critical point is the combined prefix and both tasks share
        // the period budget.
        let mut log = base_log();
        log.short_tasks = vec![
            short_task("a", at(3, 9), Duration::hours(2)),
            short_task("b", at(4, 9), Duration::hours(16)),
        ];

        let plan = plan_at(&log, at(1, 9), at(2, 9));
        assert_eq!(plan.pace, Pace::PerDay(Duration::hours(6)));
        assert_eq!(plan.critical_deadline, at(4, 9));
        assert_eq!(plan.critical_work, Duration::hours(18));
        // Quota by A's deadline: 18h * 2/3 = 12h. A takes
        // 6h * 2/12 = 1h; B the rest of the period budget.
        assert_eq!(plan.allocations["a"], Duration::hours(1));
        assert_eq!(plan.allocations["b"], Duration::hours(5));
    }

    #[test]
    fn test_overdue_task_takes_full_remaining_work() {
        // A's deadline has passed; B is comfortably out. The planner
        // switches modes: A gets everything at once, B waits, and the pace
        // is the overdue sentinel rather than a number.
        let mut log = base_log();
        log.short_tasks = vec![
            short_task("a", at(2, 9), Duration::hours(3)),
            short_task("b", at(20, 9), Duration::hours(4)),
        ];
        let now = at(4, 9);

        let plan = plan_at(&log, now, at(5, 9));
        assert_eq!(plan.pace, Pace::Overdue);
        assert_eq!(plan.allocations["a"], Duration::hours(3));
        assert!(!plan.allocations.contains_key("b"));
        assert_eq!(plan.critical_deadline, at(2, 9));
        assert_eq!(plan.critical_work, Duration::hours(3));
        assert_eq!(plan.total_recommended(), None);
    }

    #[test]
    fn test_skip_task_contributes_pressure_but_gets_nothing() {
        // Both 8h tasks are due two work-days out, but B cannot start until
        // after the horizon. B still doubles the density (8h/day instead of
        // 4h/day) and keeps its slice in the bookkeeping, yet its own share
        // is forced to zero.
        let mut log = base_log();
        log.short_tasks = vec![
            short_task("a", at(3, 9), Duration::hours(8)),
            short_task("b", at(3, 9), Duration::hours(8)),
        ];
        log.short_tasks[1].earliest_start = at(2, 13);

        let plan = plan_at(&log, at(1, 9), at(2, 9));
        assert_eq!(plan.pace, Pace::PerDay(Duration::hours(8)));
        assert_eq!(plan.allocations["a"], Duration::hours(4));
        assert_eq!(plan.allocations["b"], Duration::zero());
        assert_eq!(plan.critical_work, Duration::hours(16));
    }

    #[test]
    fn test_keep_task_reserved_outside_competition() {
        // A keep-schedule long task with 5h remaining and ten work-days of
        // life gets a 2/10 share over a two-day period, reserved outside
        // the competitive pace.
        let mut log = base_log();
        log.long_tasks = vec![LongTask {
            name: "keep".to_string(),
            title: "KEEP".to_string(),
            recorded_at: at(1, 8),
            latest_start: at(1, 9),
            deadline: at(13, 13),
            required_total: 10.0,
            keep_schedule: true,
        }];
        // 5 units at 1/h leaves 5h of work; rate from 5h over 2.5 days.
        log.progress = vec![ProgressRecord {
            task: "keep".to_string(),
            at: at(3, 13),
            progress: 5.0,
            spent: Duration::hours(5),
        }];
        log.short_tasks = vec![short_task("a", at(8, 13), Duration::hours(10))];
        let now = at(3, 13);

        let plan = plan_at(&log, now, at(5, 13));
        assert_eq!(plan.allocations["keep"], Duration::hours(1));
        assert_eq!(plan.keep_total, Duration::hours(1));
        // Competitive pace covers only the short task: 10h over 5 days.
        assert_eq!(plan.pace, Pace::PerDay(Duration::hours(2)));
        assert_eq!(
            plan.total_recommended(),
            Some(Duration::hours(3))
        );
    }

    #[test]
    fn test_unstarted_long_task_pressed_by_latest_start() {
        // No progress yet: the planner times the cold-start placeholder
        // against the latest-start instant, not the far deadline.
        let mut log = base_log();
        log.long_tasks = vec![LongTask {
            name: "l".to_string(),
            title: "L".to_string(),
            recorded_at: at(1, 8),
            latest_start: at(3, 9),
            deadline: at(30, 9),
            required_total: 10.0,
            keep_schedule: false,
        }];

        let plan = plan_at(&log, at(1, 9), at(2, 9));
        assert_eq!(plan.critical_deadline, at(3, 9));
        assert_eq!(plan.critical_work, Duration::minutes(20));
        // Placeholder spread over two work-days, one-day period.
        assert_eq!(plan.allocations["l"], Duration::minutes(10));
    }

    #[test]
    fn test_completed_short_task_before_baseline_dropped() {
        let mut log = base_log();
        log.short_tasks = vec![short_task("done", at(10, 9), Duration::hours(2))];
        log.short_tasks[0].completed_at = Some(at(2, 9));

        let plan = plan_at(&log, at(3, 9), at(4, 9));
        assert!(plan.allocations.is_empty());
    }
}
