use super::{effective_lag, shift_work_hours};
use crate::error::ScheduleError;
use crate::graph::TaskNetwork;
use crate::task::{CalendarSet, ConstraintKind, DateConstraint, DependencyKind, TaskStatus};
use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;

pub struct ForwardPass<'a> {
    network: &'a TaskNetwork,
    calendars: &'a CalendarSet,
}

impl<'a> ForwardPass<'a> {
    pub fn new(network: &'a TaskNetwork, calendars: &'a CalendarSet) -> Self {
        Self { network, calendars }
    }

    /// Compute (early_start, early_finish) for every task, keyed by id.
    /// `order` must be a topological order of the network; `constraints`
    /// holds the constraints still active for this run.
    pub fn execute(
        &self,
        project_start: NaiveDateTime,
        order: &[i32],
        constraints: &FxHashMap<i32, DateConstraint>,
    ) -> Result<FxHashMap<i32, (NaiveDateTime, NaiveDateTime)>, ScheduleError> {
        let mut dates: FxHashMap<i32, (NaiveDateTime, NaiveDateTime)> = FxHashMap::default();

        for &task_id in order {
            let task = self
                .network
                .task(task_id)
                .ok_or(ScheduleError::UnknownTask { task_id })?;
            let calendar = self.calendars.resolve(task)?;

            // Completed work is authoritative; planned dates are not recomputed.
            if task.status == TaskStatus::Complete {
                if let (Some(actual_start), Some(actual_finish)) =
                    (task.actual_start, task.actual_finish)
                {
                    dates.insert(task_id, (actual_start, actual_finish));
                    continue;
                }
            }

            let duration = task.effective_duration();

            let early_start = if task.status == TaskStatus::InProgress {
                // Started work is pinned to where it actually started.
                task.actual_start.unwrap_or(project_start)
            } else {
                let mut start = project_start;
                for (dependency, pred_id) in self.network.incoming(task_id) {
                    let predecessor = self
                        .network
                        .task(pred_id)
                        .ok_or(ScheduleError::UnknownTask { task_id: pred_id })?;
                    let &(pred_start, pred_finish) = dates
                        .get(&pred_id)
                        .expect("predecessor not yet visited in topological order");
                    let lag = effective_lag(dependency, predecessor, task);

                    let driven = match dependency.kind {
                        DependencyKind::FinishToStart => {
                            shift_work_hours(calendar, pred_finish, lag)
                        }
                        DependencyKind::StartToStart => shift_work_hours(calendar, pred_start, lag),
                        DependencyKind::FinishToFinish => {
                            let finish = shift_work_hours(calendar, pred_finish, lag);
                            shift_work_hours(calendar, finish, -duration)
                        }
                        DependencyKind::StartToFinish => {
                            let finish = shift_work_hours(calendar, pred_start, lag);
                            shift_work_hours(calendar, finish, -duration)
                        }
                    };
                    if driven > start {
                        start = driven;
                    }
                }
                if let Some(constraint) = constraints.get(&task_id) {
                    if constraint.kind == ConstraintKind::StartNoEarlier && constraint.date > start
                    {
                        start = constraint.date;
                    }
                }
                start
            };

            // Milestones have zero duration, so early_finish == early_start
            // exactly; never advanced to a following work period.
            let early_finish = calendar.add_work_hours(early_start, duration);
            dates.insert(task_id, (early_start, early_finish));
        }

        Ok(dates)
    }
}
