//! Preference list handling: disabling tasks and output ordering.

use crate::model::{Preference, TableRow};

/// Whether `name` is disabled by the preference list.
pub fn is_disabled(name: &str, preferences: &[Preference]) -> bool {
    preferences
        .iter()
        .any(|pref| pref.name == name && pref.disabled)
}

/// Position of `name` in the preference list; unlisted names sort last.
pub fn priority_of(name: &str, preferences: &[Preference]) -> usize {
    preferences
        .iter()
        .position(|pref| pref.name == name)
        .unwrap_or(preferences.len())
}

/// Enabled rows in preference order. Unlisted rows keep their relative
/// order after the listed ones (the sort is stable).
pub fn prefer<'a, T: TableRow>(
    rows: impl IntoIterator<Item = &'a T>,
    preferences: &[Preference],
) -> Vec<&'a T> {
    let mut kept: Vec<&T> = rows
        .into_iter()
        .filter(|row| !is_disabled(row.name(), preferences))
        .collect();
    kept.sort_by_key(|row| priority_of(row.name(), preferences));
    kept
}
