use std::path::Path;

use chrono::{DateTime, Utc};
use paceline_core::{collect_state, AllocationPlanner, Evaluation, Plan, ScoringEngine};
use serde::Serialize;

use crate::loader;

/// Plan output: the allocation plus both evaluations' point totals.
#[derive(Serialize)]
struct PlanReport {
    points: i64,
    baseline_points: i64,
    /// Competitive pace plus keep reserve, in seconds; absent while
    /// overdue.
    total_recommended: Option<i64>,
    plan: Plan,
}

pub fn run(
    file: &Path,
    at: Option<DateTime<Utc>>,
    baseline: Option<DateTime<Utc>>,
    until: DateTime<Utc>,
) -> Result<(), Box<dyn std::error::Error>> {
    let log = loader::load(file)?;
    let now = at.unwrap_or_else(Utc::now);
    let baseline_at = baseline.unwrap_or(now);

    let state = collect_state(&log, now)?;
    let baseline_state = collect_state(&log, baseline_at)?;
    let engine = ScoringEngine::new(state.calendar.clone());
    let stats = engine.evaluate(&state, now);
    let baseline_stats = engine.evaluate(&baseline_state, baseline_at);

    let planner = AllocationPlanner::new(state.calendar.clone());
    let plan = planner.plan(
        &Evaluation {
            time: now,
            state: &state,
            stats: &stats,
        },
        &Evaluation {
            time: baseline_at,
            state: &baseline_state,
            stats: &baseline_stats,
        },
        until,
    );

    let report = PlanReport {
        points: stats.total_points,
        baseline_points: baseline_stats.total_points,
        total_recommended: plan.total_recommended().map(|d| d.num_seconds()),
        plan,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
