use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal conditions that abort an analysis run for a network.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("dependency cycle detected; unresolved tasks: {remaining:?}")]
    CycleDetected { remaining: Vec<i32> },

    #[error("task {task_id} references unknown calendar {calendar_id} and no fallback is configured")]
    UnknownCalendar { task_id: i32, calendar_id: i32 },

    #[error("task {task_id} not found in network")]
    UnknownTask { task_id: i32 },

    #[error("network {snapshot:?} contains no tasks")]
    EmptyNetwork { snapshot: String },

    #[error("duplicate task id {task_id}")]
    DuplicateTask { task_id: i32 },

    #[error(transparent)]
    InvalidTask(#[from] TaskValidationError),
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TaskValidationError {
    message: String,
}

impl TaskValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Calendar records are validated once at construction.
#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("calendar has no work periods in its weekly template")]
    EmptyWeek,

    #[error("work periods on {context} are unordered or overlapping")]
    OverlappingPeriods { context: String },

    #[error("work period must start before it ends ({start}..{end})")]
    EmptyPeriod { start: NaiveTime, end: NaiveTime },

    #[error("hours_per_day must be positive (got {0})")]
    NonPositiveHours(f64),
}

/// Recoverable data-quality findings. These never abort a run; they are
/// accumulated onto the successful result so callers can audit the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    DanglingDependency { predecessor: i32, successor: i32 },
    InvalidConstraint { task_id: i32, reason: String },
}
