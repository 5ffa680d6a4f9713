//! Snapshot folding of append-only event tables.
//!
//! "Current state" is a pure function of the event tables and a cutoff
//! instant: rows are folded in timestamp order, later rows replacing
//! earlier ones with the same name and deletion rows removing them. Rows
//! at or after the cutoff have not happened yet and are invisible, so the
//! same tables can be replayed at any instant.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{WorkCalendar, WorkWindow};
use crate::error::Result;
use crate::model::{Deletion, LongTask, Preference, ProgressRecord, ShortTask, TableRow};

/// Append-only source tables for one planner workbook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLog {
    pub long_tasks: Vec<LongTask>,
    pub long_deletions: Vec<Deletion>,
    pub short_tasks: Vec<ShortTask>,
    pub short_deletions: Vec<Deletion>,
    pub progress: Vec<ProgressRecord>,
    pub worktime: Vec<WorkWindow>,
    pub preferences: Vec<Preference>,
}

/// Task state resolved as of one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub long_tasks: BTreeMap<String, LongTask>,
    /// Chronological progress log per long task. May reference tasks that
    /// were deleted later; consumers ignore such entries.
    pub progress: BTreeMap<String, Vec<ProgressRecord>>,
    pub short_tasks: BTreeMap<String, ShortTask>,
    pub calendar: WorkCalendar,
    pub preferences: Vec<Preference>,
}

/// Fold the append-only tables into the state visible at `cutoff`.
///
/// Fails only when the configured calendar has no working time.
pub fn collect_state(log: &EventLog, cutoff: DateTime<Utc>) -> Result<State> {
    Ok(State {
        long_tasks: fold_table(&log.long_tasks, &log.long_deletions, cutoff),
        progress: fold_progress(&log.progress, cutoff),
        short_tasks: fold_table(&log.short_tasks, &log.short_deletions, cutoff),
        calendar: WorkCalendar::new(log.worktime.clone())?,
        preferences: log.preferences.clone(),
    })
}

enum Edit<'a, T> {
    Put(&'a T),
    Delete(&'a Deletion),
}

/// Replay one task table up to `cutoff`.
fn fold_table<T: TableRow + Clone>(
    rows: &[T],
    deletions: &[Deletion],
    cutoff: DateTime<Utc>,
) -> BTreeMap<String, T> {
    let mut edits: Vec<(DateTime<Utc>, Edit<'_, T>)> = rows
        .iter()
        .map(|row| (row.recorded_at(), Edit::Put(row)))
        .chain(deletions.iter().map(|del| (del.at, Edit::Delete(del))))
        .collect();
    // Stable: rows recorded at the same instant apply in table order.
    edits.sort_by_key(|(at, _)| *at);

    let mut snapshot = BTreeMap::new();
    for (at, edit) in edits {
        if at >= cutoff {
            continue;
        }
        match edit {
            Edit::Put(row) => {
                snapshot.insert(row.name().to_string(), row.clone());
            }
            Edit::Delete(del) => {
                // Deleting an absent name is a no-op.
                snapshot.remove(&del.name);
            }
        }
    }
    snapshot
}

/// Group progress records by task, chronologically, up to `cutoff`.
fn fold_progress(
    records: &[ProgressRecord],
    cutoff: DateTime<Utc>,
) -> BTreeMap<String, Vec<ProgressRecord>> {
    let mut visible: Vec<&ProgressRecord> = records.iter().filter(|rec| rec.at < cutoff).collect();
    visible.sort_by_key(|rec| rec.at);

    let mut snapshot: BTreeMap<String, Vec<ProgressRecord>> = BTreeMap::new();
    for record in visible {
        snapshot
            .entry(record.task.clone())
            .or_default()
            .push(record.clone());
    }
    snapshot
}
