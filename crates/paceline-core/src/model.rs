//! Task and event-table data model.
//!
//! Rows mirror the append-only source tables: a task row carries the
//! timestamp it was recorded at, and later rows with the same name replace
//! earlier ones when folded into a snapshot (see [`crate::state`]).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Serialize a `chrono::Duration` as whole seconds.
pub mod duration_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        i64::deserialize(deserializer).map(Duration::seconds)
    }
}

/// Serialize an `Option<chrono::Duration>` as whole seconds.
pub mod duration_seconds_opt {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.num_seconds()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<i64>::deserialize(deserializer)?.map(Duration::seconds))
    }
}

/// Serialize a name-to-duration map as whole seconds per entry.
pub mod duration_seconds_map {
    use std::collections::BTreeMap;

    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &BTreeMap<String, Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let seconds: BTreeMap<&str, i64> = value
            .iter()
            .map(|(name, duration)| (name.as_str(), duration.num_seconds()))
            .collect();
        seconds.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Duration>, D::Error> {
        let seconds = BTreeMap::<String, i64>::deserialize(deserializer)?;
        Ok(seconds
            .into_iter()
            .map(|(name, value)| (name, Duration::seconds(value)))
            .collect())
    }
}

/// Rows keyed by task name in an append-only table.
pub trait TableRow {
    /// Stable task key, referenced by progress records and preferences.
    fn name(&self) -> &str;
    /// Timestamp the row was recorded at.
    fn recorded_at(&self) -> DateTime<Utc>;
}

/// A long-running task measured by cumulative progress against a required
/// total (pages read, exercises solved, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongTask {
    pub name: String,
    /// Human-readable title for reports.
    pub title: String,
    /// Timestamp of this row in the append-only table.
    pub recorded_at: DateTime<Utc>,
    /// Latest instant work may begin without falling behind.
    pub latest_start: DateTime<Utc>,
    /// Hard deadline.
    pub deadline: DateTime<Utc>,
    /// Total progress required to finish.
    pub required_total: f64,
    /// Exempt from competitive allocation; given a fixed self-paced share.
    #[serde(default)]
    pub keep_schedule: bool,
}

impl TableRow for LongTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// A short-lived task with a single duration estimate instead of a
/// progress log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortTask {
    pub name: String,
    pub title: String,
    /// Timestamp of this row in the append-only table.
    pub recorded_at: DateTime<Utc>,
    /// Hard deadline.
    pub deadline: DateTime<Utc>,
    /// Earliest instant the task can be started at all.
    pub earliest_start: DateTime<Utc>,
    /// Estimated required work time.
    #[serde(with = "duration_seconds")]
    pub estimate: Duration,
    /// When the task was finished, if it has been.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Actual work time spent, if recorded.
    #[serde(default, with = "duration_seconds_opt")]
    pub actual: Option<Duration>,
}

impl TableRow for ShortTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// One progress log entry: after spending `spent` of work time, the task
/// reached cumulative `progress` at instant `at`.
///
/// Per-task logs are append-only and ordered by timestamp; progress is
/// expected to be monotonically non-decreasing (the caller's
/// responsibility, not enforced here).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Name of the task this entry belongs to.
    pub task: String,
    pub at: DateTime<Utc>,
    /// Cumulative progress as of `at`.
    #[serde(default)]
    pub progress: f64,
    /// Work time spent reaching this entry from the previous one.
    #[serde(default = "Duration::zero", with = "duration_seconds")]
    pub spent: Duration,
}

/// A deletion row in an append-only table: removes `name` as of `at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deletion {
    pub name: String,
    pub at: DateTime<Utc>,
}

/// A preference row. List position sets output priority (unlisted tasks
/// come last, in stable order); `disabled` removes the task from scoring
/// and allocation entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    pub name: String,
    #[serde(default)]
    pub disabled: bool,
}
