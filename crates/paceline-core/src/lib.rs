//! # Paceline Core Library
//!
//! This library is the scheduling/allocation core of the paceline deadline
//! planner: given tasks with deadlines and historical progress logs, it
//! estimates recent work velocity, converts wall-clock time into work-day
//! units bounded by a recurring business-hours calendar, scores tasks by
//! how far ahead or behind schedule they run, and apportions an upcoming
//! period's time budget so every task stays on track.
//!
//! ## Architecture
//!
//! - **Calendar**: recurring daily work windows; instant pairs become
//!   fractional work-day spans
//! - **Velocity**: dual-bounded trailing-window estimate of rate and daily
//!   throughput from a task's progress log
//! - **Scoring**: per-task point scores plus an aggregate total
//! - **Planner**: critical-point allocation of a period's budget, with a
//!   separate overdue mode
//!
//! The core is single-threaded, synchronous, and stateless: every
//! evaluation is a pure function of `(state, now, horizon)`. Loading event
//! tables and rendering output belong to the surrounding layers.
//!
//! ## Key Components
//!
//! - [`WorkCalendar`]: work-day arithmetic
//! - [`VelocityEstimator`]: recent rate and throughput
//! - [`ScoringEngine`]: point scores
//! - [`AllocationPlanner`]: per-task period allocations

pub mod calendar;
pub mod error;
pub mod model;
pub mod planner;
pub mod preference;
pub mod scoring;
pub mod state;
pub mod velocity;

pub use calendar::{WorkCalendar, WorkWindow};
pub use error::{CalendarError, CoreError, Result};
pub use model::{Deletion, LongTask, Preference, ProgressRecord, ShortTask, TableRow};
pub use planner::{AllocationPlanner, Evaluation, Pace, Plan, PlannerConfig};
pub use preference::{is_disabled, prefer, priority_of};
pub use scoring::{LongTaskStats, ScoringConfig, ScoringEngine, ShortTaskStats, StateStats};
pub use state::{collect_state, EventLog, State};
pub use velocity::{Velocity, VelocityConfig, VelocityEstimator};
