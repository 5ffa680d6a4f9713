//! Core error types for paceline-core.
//!
//! The core performs no I/O, so the hierarchy is small: configuration
//! errors are fatal and propagated, everything else is an expected state
//! with an explicit fallback value rather than an error.

use thiserror::Error;

/// Work-calendar configuration errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarError {
    /// The configured windows add up to zero working time per day, which
    /// makes every work-day span a division by zero. There is no sane
    /// default rate, so this is rejected instead of guessed at.
    #[error("work calendar has no working time; work-day spans are undefined")]
    EmptyWorkday,
}

/// Core error type for paceline-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Calendar configuration errors
    #[error("calendar error: {0}")]
    Calendar(#[from] CalendarError),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
