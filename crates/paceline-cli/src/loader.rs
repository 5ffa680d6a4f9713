//! TOML task-log loading.
//!
//! The log file carries the same append-only tables the core folds:
//! `[[worktime]]` windows, `[[long_tasks]]` / `[[short_tasks]]` rows with
//! their `[[long_deletions]]` / `[[short_deletions]]`, `[[progress]]`
//! records, and the `[[preferences]]` list. Timestamps are quoted RFC 3339
//! strings, times of day are `"HH:MM:SS"`, and durations are integer
//! seconds.
//!
//! ```toml
//! [[worktime]]
//! start = "09:00:00"
//! end = "17:00:00"
//!
//! [[long_tasks]]
//! name = "thesis"
//! title = "Write thesis"
//! recorded_at = "2026-01-01T08:00:00Z"
//! latest_start = "2026-01-05T09:00:00Z"
//! deadline = "2026-06-01T17:00:00Z"
//! required_total = 120.0
//!
//! [[progress]]
//! task = "thesis"
//! at = "2026-01-06T15:00:00Z"
//! progress = 3.5
//! spent = 7200
//! ```

use std::fs;
use std::path::Path;

use paceline_core::EventLog;

/// Read and parse a TOML task log.
pub fn load(path: &Path) -> Result<EventLog, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let log: EventLog = toml::from_str(&text)?;
    Ok(log)
}
