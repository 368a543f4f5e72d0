use super::{effective_lag, shift_work_hours};
use crate::error::ScheduleError;
use crate::graph::TaskNetwork;
use crate::task::{CalendarSet, ConstraintKind, DateConstraint, DependencyKind};
use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;

pub struct BackwardPass<'a> {
    network: &'a TaskNetwork,
    calendars: &'a CalendarSet,
}

impl<'a> BackwardPass<'a> {
    pub fn new(network: &'a TaskNetwork, calendars: &'a CalendarSet) -> Self {
        Self { network, calendars }
    }

    /// Compute (late_start, late_finish) for every task, keyed by id,
    /// walking `order` in reverse from the project finish.
    pub fn execute(
        &self,
        project_finish: NaiveDateTime,
        order: &[i32],
        constraints: &FxHashMap<i32, DateConstraint>,
    ) -> Result<FxHashMap<i32, (NaiveDateTime, NaiveDateTime)>, ScheduleError> {
        let mut dates: FxHashMap<i32, (NaiveDateTime, NaiveDateTime)> = FxHashMap::default();

        for &task_id in order.iter().rev() {
            let task = self
                .network
                .task(task_id)
                .ok_or(ScheduleError::UnknownTask { task_id })?;
            let calendar = self.calendars.resolve(task)?;
            let duration = task.effective_duration();

            let mut late_finish = project_finish;
            for (dependency, succ_id) in self.network.outgoing(task_id) {
                let successor = self
                    .network
                    .task(succ_id)
                    .ok_or(ScheduleError::UnknownTask { task_id: succ_id })?;
                let succ_calendar = self.calendars.resolve(successor)?;
                let &(succ_late_start, succ_late_finish) = dates
                    .get(&succ_id)
                    .expect("successor not yet visited in reverse topological order");
                let lag = effective_lag(dependency, task, successor);

                // Mirror of the forward driven-date rules: each relationship
                // bounds this task's late finish through the successor's
                // late dates.
                let allowed = match dependency.kind {
                    DependencyKind::FinishToStart => {
                        shift_work_hours(succ_calendar, succ_late_start, -lag)
                    }
                    DependencyKind::StartToStart => {
                        let late_start = shift_work_hours(succ_calendar, succ_late_start, -lag);
                        shift_work_hours(calendar, late_start, duration)
                    }
                    DependencyKind::FinishToFinish => {
                        shift_work_hours(succ_calendar, succ_late_finish, -lag)
                    }
                    DependencyKind::StartToFinish => {
                        let late_start = shift_work_hours(succ_calendar, succ_late_finish, -lag);
                        shift_work_hours(calendar, late_start, duration)
                    }
                };
                if allowed < late_finish {
                    late_finish = allowed;
                }
            }

            if let Some(constraint) = constraints.get(&task_id) {
                if constraint.kind == ConstraintKind::FinishNoLater
                    && constraint.date < late_finish
                {
                    late_finish = constraint.date;
                }
            }

            let late_start = calendar.subtract_work_hours(late_finish, duration);
            dates.insert(task_id, (late_start, late_finish));
        }

        Ok(dates)
    }
}
