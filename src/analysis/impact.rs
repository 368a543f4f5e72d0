use super::finishing_calendar;
use crate::engine;
use crate::error::ScheduleError;
use crate::graph::TaskNetwork;
use crate::task::CalendarSet;
use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskImpactResult {
    pub task_id: i32,
    pub duration_delta_hours: f64,
    pub baseline_finish: NaiveDateTime,
    pub modified_finish: NaiveDateTime,
    /// Work-hours the project finish moved, measured on the calendar of the
    /// baseline's finishing task. Positive means the project slipped.
    pub slip_hours: f64,
    /// Ids whose early finish moved between the two runs, ascending.
    pub affected_tasks: Vec<i32>,
    pub baseline_critical_path: Vec<i32>,
    pub modified_critical_path: Vec<i32>,
}

/// What-if for a single task: rerun CPM with its duration perturbed by
/// `duration_delta_hours` on a cloned network and diff the outcomes. The
/// baseline network is never mutated.
pub fn analyze_task_impact(
    network: &TaskNetwork,
    calendars: &CalendarSet,
    task_id: i32,
    duration_delta_hours: f64,
    project_start: Option<NaiveDateTime>,
) -> Result<TaskImpactResult, ScheduleError> {
    if network.task(task_id).is_none() {
        return Err(ScheduleError::UnknownTask { task_id });
    }

    let baseline = engine::run(network, calendars, project_start)?;

    let mut scenario = network.clone();
    if let Some(task) = scenario.task_mut(task_id) {
        if !task.is_milestone() {
            task.duration_hours = (task.duration_hours + duration_delta_hours).max(0.0);
            if let Some(remaining) = task.remaining_hours {
                task.remaining_hours = Some((remaining + duration_delta_hours).max(0.0));
            }
        }
    }

    // Anchor both runs at the same project start so the diff is pure
    // duration effect.
    let modified = engine::run(&scenario, calendars, Some(baseline.project_start))?;

    let slip_hours = match finishing_calendar(&baseline, calendars) {
        Some(calendar) => {
            calendar.work_hours_between(baseline.project_finish, modified.project_finish)
        }
        None => 0.0,
    };

    let baseline_finishes: FxHashMap<i32, NaiveDateTime> = baseline
        .tasks
        .iter()
        .filter_map(|task| task.early_finish.map(|finish| (task.id, finish)))
        .collect();
    let mut affected_tasks: Vec<i32> = modified
        .tasks
        .iter()
        .filter(|task| baseline_finishes.get(&task.id).copied() != task.early_finish)
        .map(|task| task.id)
        .collect();
    affected_tasks.sort_unstable();

    debug!(
        task_id,
        duration_delta_hours,
        slip_hours,
        affected = affected_tasks.len(),
        "task impact computed"
    );

    Ok(TaskImpactResult {
        task_id,
        duration_delta_hours,
        baseline_finish: baseline.project_finish,
        modified_finish: modified.project_finish,
        slip_hours,
        affected_tasks,
        baseline_critical_path: baseline.critical_path,
        modified_critical_path: modified.critical_path,
    })
}
