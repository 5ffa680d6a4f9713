use std::path::Path;

use chrono::{DateTime, Utc};
use paceline_core::{collect_state, ScoringEngine};

use crate::loader;

pub fn run(file: &Path, at: Option<DateTime<Utc>>) -> Result<(), Box<dyn std::error::Error>> {
    let log = loader::load(file)?;
    let now = at.unwrap_or_else(Utc::now);
    let state = collect_state(&log, now)?;
    let stats = ScoringEngine::new(state.calendar.clone()).evaluate(&state, now);
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
