use crate::calendar::WorkCalendar;
use crate::error::{ScheduleError, TaskValidationError};
use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    Normal,
    StartMilestone,
    FinishMilestone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    StartNoEarlier,
    FinishNoLater,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateConstraint {
    pub kind: ConstraintKind,
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyKind {
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

/// Precedence relationship between two tasks. Lag is signed work-hours;
/// negative lag overlaps the successor into the predecessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub predecessor: i32,
    pub successor: i32,
    pub kind: DependencyKind,
    pub lag_hours: f64,
}

impl Dependency {
    pub fn new(predecessor: i32, successor: i32, kind: DependencyKind, lag_hours: f64) -> Self {
        Self {
            predecessor,
            successor,
            kind,
            lag_hours,
        }
    }

    pub fn finish_to_start(predecessor: i32, successor: i32) -> Self {
        Self::new(predecessor, successor, DependencyKind::FinishToStart, 0.0)
    }
}

/// One schedule activity. `id` is local to a single snapshot; `code` is the
/// natural key that stays stable across snapshots and is what cross-snapshot
/// analyses match on.
///
/// The early/late/float fields are computed outputs, populated only by the
/// engine; loaders leave them `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub duration_hours: f64,
    pub calendar_id: i32,
    pub status: TaskStatus,
    pub kind: TaskKind,
    pub constraint: Option<DateConstraint>,
    pub actual_start: Option<NaiveDateTime>,
    pub actual_finish: Option<NaiveDateTime>,
    pub remaining_hours: Option<f64>,
    pub early_start: Option<NaiveDateTime>,
    pub early_finish: Option<NaiveDateTime>,
    pub late_start: Option<NaiveDateTime>,
    pub late_finish: Option<NaiveDateTime>,
    pub total_float_hours: Option<f64>,
    pub is_critical: Option<bool>,
}

impl Task {
    pub fn new(
        id: i32,
        code: impl Into<String>,
        name: impl Into<String>,
        duration_hours: f64,
        calendar_id: i32,
    ) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
            duration_hours,
            calendar_id,
            status: TaskStatus::NotStarted,
            kind: TaskKind::Normal,
            constraint: None,
            actual_start: None,
            actual_finish: None,
            remaining_hours: None,
            early_start: None,
            early_finish: None,
            late_start: None,
            late_finish: None,
            total_float_hours: None,
            is_critical: None,
        }
    }

    pub fn milestone(
        id: i32,
        code: impl Into<String>,
        name: impl Into<String>,
        kind: TaskKind,
        calendar_id: i32,
    ) -> Self {
        let mut task = Self::new(id, code, name, 0.0, calendar_id);
        task.kind = kind;
        task
    }

    pub fn is_milestone(&self) -> bool {
        matches!(self.kind, TaskKind::StartMilestone | TaskKind::FinishMilestone)
    }

    /// Duration used for dating: remaining hours while in progress, zero for
    /// milestones, the planned duration otherwise.
    pub fn effective_duration(&self) -> f64 {
        if self.is_milestone() {
            return 0.0;
        }
        match self.status {
            TaskStatus::InProgress => self.remaining_hours.unwrap_or(self.duration_hours),
            _ => self.duration_hours,
        }
    }
}

pub fn validate_task(task: &Task) -> Result<(), TaskValidationError> {
    if task.duration_hours < 0.0 || !task.duration_hours.is_finite() {
        return Err(TaskValidationError::new(format!(
            "task {} has invalid duration {}",
            task.id, task.duration_hours
        )));
    }

    if task.is_milestone() && task.duration_hours != 0.0 {
        return Err(TaskValidationError::new(format!(
            "milestone task {} must have zero duration (got {})",
            task.id, task.duration_hours
        )));
    }

    if let Some(remaining) = task.remaining_hours {
        if remaining < 0.0 || !remaining.is_finite() {
            return Err(TaskValidationError::new(format!(
                "task {} has invalid remaining_hours {}",
                task.id, remaining
            )));
        }
    }

    match task.status {
        TaskStatus::InProgress => {
            if task.actual_start.is_none() {
                return Err(TaskValidationError::new(format!(
                    "in-progress task {} requires actual_start",
                    task.id
                )));
            }
        }
        TaskStatus::Complete => {
            if task.actual_start.is_none() || task.actual_finish.is_none() {
                return Err(TaskValidationError::new(format!(
                    "complete task {} requires actual_start and actual_finish",
                    task.id
                )));
            }
        }
        TaskStatus::NotStarted => {}
    }

    Ok(())
}

/// Loader-facing calendar mapping, keyed by calendar id, with an optional
/// fallback for tasks whose calendar is missing from the export.
#[derive(Debug, Clone, Default)]
pub struct CalendarSet {
    calendars: FxHashMap<i32, WorkCalendar>,
    fallback: Option<WorkCalendar>,
}

impl CalendarSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: i32, calendar: WorkCalendar) {
        self.calendars.insert(id, calendar);
    }

    pub fn with_fallback(mut self, calendar: WorkCalendar) -> Self {
        self.fallback = Some(calendar);
        self
    }

    pub fn get(&self, id: i32) -> Option<&WorkCalendar> {
        self.calendars.get(&id).or(self.fallback.as_ref())
    }

    pub fn resolve(&self, task: &Task) -> Result<&WorkCalendar, ScheduleError> {
        self.get(task.calendar_id)
            .ok_or(ScheduleError::UnknownCalendar {
                task_id: task.id,
                calendar_id: task.calendar_id,
            })
    }
}
