use crate::calendar::WorkCalendar;
use crate::task::{Dependency, DependencyKind, Task, TaskStatus};
use chrono::NaiveDateTime;

pub mod backward_pass;
pub mod forward_pass;

pub use backward_pass::BackwardPass;
pub use forward_pass::ForwardPass;

/// Signed work-hour offset: forward for positive hours, backward for
/// negative (overlap lag).
pub(crate) fn shift_work_hours(
    calendar: &WorkCalendar,
    from: NaiveDateTime,
    hours: f64,
) -> NaiveDateTime {
    if hours >= 0.0 {
        calendar.add_work_hours(from, hours)
    } else {
        calendar.subtract_work_hours(from, -hours)
    }
}

/// Lag actually applied for a dependency, given predecessor and successor
/// state. Finish-to-start and start-to-start lags are ordering constraints:
/// once the predecessor is complete (or both sides are already running) the
/// ordering is satisfied in reality and the lag is dropped. Finish-to-finish
/// and start-to-finish lags constrain the successor's finish, which no
/// completed predecessor resolves, so they always apply.
pub(crate) fn effective_lag(dependency: &Dependency, predecessor: &Task, successor: &Task) -> f64 {
    match dependency.kind {
        DependencyKind::FinishToStart | DependencyKind::StartToStart => {
            if predecessor.status == TaskStatus::Complete {
                0.0
            } else if predecessor.status == TaskStatus::InProgress
                && successor.status == TaskStatus::InProgress
            {
                0.0
            } else {
                dependency.lag_hours
            }
        }
        DependencyKind::FinishToFinish | DependencyKind::StartToFinish => dependency.lag_hours,
    }
}
