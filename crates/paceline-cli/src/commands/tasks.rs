use std::path::Path;

use chrono::{DateTime, Utc};
use paceline_core::{collect_state, prefer};
use serde::Serialize;

use crate::loader;

#[derive(Serialize)]
struct TaskRow<'a> {
    name: &'a str,
    title: &'a str,
    deadline: DateTime<Utc>,
}

#[derive(Serialize)]
struct TaskListing<'a> {
    long_tasks: Vec<TaskRow<'a>>,
    short_tasks: Vec<TaskRow<'a>>,
}

pub fn run(file: &Path, at: Option<DateTime<Utc>>) -> Result<(), Box<dyn std::error::Error>> {
    let log = loader::load(file)?;
    let now = at.unwrap_or_else(Utc::now);
    let state = collect_state(&log, now)?;

    let listing = TaskListing {
        long_tasks: prefer(state.long_tasks.values(), &state.preferences)
            .into_iter()
            .map(|task| TaskRow {
                name: &task.name,
                title: &task.title,
                deadline: task.deadline,
            })
            .collect(),
        short_tasks: prefer(state.short_tasks.values(), &state.preferences)
            .into_iter()
            .map(|task| TaskRow {
                name: &task.name,
                title: &task.title,
                deadline: task.deadline,
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}
