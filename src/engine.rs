use crate::calculations::{BackwardPass, ForwardPass};
use crate::error::{Diagnostic, ScheduleError};
use crate::graph::TaskNetwork;
use crate::task::{CalendarSet, ConstraintKind, DateConstraint, Task, TaskStatus};
use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Output of one CPM run. Pure data; never mutated after construction.
/// `tasks` carries every task with its computed fields filled, ordered by
/// early start (ties by id); `critical_path` lists critical task ids in the
/// same execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpmResult {
    pub snapshot: String,
    pub tasks: Vec<Task>,
    pub critical_path: Vec<i32>,
    pub project_start: NaiveDateTime,
    pub project_finish: NaiveDateTime,
    pub total_duration_hours: f64,
    pub diagnostics: Vec<Diagnostic>,
}

impl CpmResult {
    pub fn task(&self, id: i32) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Calendar id of the task that sets the project finish; total project
    /// duration is measured on that task's calendar.
    pub(crate) fn finishing_calendar_id(&self) -> Option<i32> {
        self.tasks
            .iter()
            .find(|task| task.early_finish == Some(self.project_finish))
            .map(|task| task.calendar_id)
    }
}

/// Run the critical path method over one network: forward pass, backward
/// pass anchored at the implied project finish, then float and the critical
/// flag for every task.
///
/// When `project_start` is omitted, the earliest actual start present in the
/// network is used; failing that, the current time. The network is never
/// mutated; results are computed into the returned `CpmResult`.
pub fn run(
    network: &TaskNetwork,
    calendars: &CalendarSet,
    project_start: Option<NaiveDateTime>,
) -> Result<CpmResult, ScheduleError> {
    if network.is_empty() {
        return Err(ScheduleError::EmptyNetwork {
            snapshot: network.snapshot().to_string(),
        });
    }

    // Surface calendar problems before any traversal.
    for task in network.tasks() {
        calendars.resolve(task)?;
    }

    let order = network.topological_order()?;
    let project_start = project_start.unwrap_or_else(|| default_project_start(network));
    let (constraints, mut diagnostics) = active_constraints(network, &order, project_start);

    let forward = ForwardPass::new(network, calendars).execute(project_start, &order, &constraints)?;
    let project_finish = forward
        .values()
        .map(|&(_, early_finish)| early_finish)
        .max()
        .expect("forward pass covered a non-empty network");
    debug!(
        snapshot = network.snapshot(),
        tasks = order.len(),
        %project_start,
        %project_finish,
        "forward pass complete"
    );

    let backward =
        BackwardPass::new(network, calendars).execute(project_finish, &order, &constraints)?;
    debug!(snapshot = network.snapshot(), "backward pass complete");

    let mut tasks: Vec<Task> = Vec::with_capacity(network.len());
    for &task_id in &order {
        let task = network
            .task(task_id)
            .ok_or(ScheduleError::UnknownTask { task_id })?;
        let calendar = calendars.resolve(task)?;
        let mut task = task.clone();
        let &(early_start, early_finish) = forward
            .get(&task.id)
            .ok_or(ScheduleError::UnknownTask { task_id: task.id })?;
        let &(late_start, late_finish) = backward
            .get(&task.id)
            .ok_or(ScheduleError::UnknownTask { task_id: task.id })?;

        let total_float = calendar.work_hours_between(early_finish, late_finish);
        task.early_start = Some(early_start);
        task.early_finish = Some(early_finish);
        task.late_start = Some(late_start);
        task.late_finish = Some(late_finish);
        task.total_float_hours = Some(total_float);
        task.is_critical = Some(total_float <= 0.0);
        tasks.push(task);
    }
    tasks.sort_by(|a, b| a.early_start.cmp(&b.early_start).then(a.id.cmp(&b.id)));

    let critical_path: Vec<i32> = tasks
        .iter()
        .filter(|task| task.is_critical == Some(true))
        .map(|task| task.id)
        .collect();

    let mut result = CpmResult {
        snapshot: network.snapshot().to_string(),
        tasks,
        critical_path,
        project_start,
        project_finish,
        total_duration_hours: 0.0,
        diagnostics: Vec::new(),
    };
    if let Some(calendar_id) = result.finishing_calendar_id() {
        if let Some(calendar) = calendars.get(calendar_id) {
            result.total_duration_hours =
                calendar.work_hours_between(project_start, project_finish);
        }
    }

    result.diagnostics.extend_from_slice(network.diagnostics());
    result.diagnostics.append(&mut diagnostics);

    Ok(result)
}

fn default_project_start(network: &TaskNetwork) -> NaiveDateTime {
    network
        .tasks()
        .filter_map(|task| task.actual_start)
        .min()
        .unwrap_or_else(|| chrono::Local::now().naive_local())
}

/// Constraints still honored for this run. A constraint on completed work,
/// or a finish-no-later date preceding the project start, cannot be applied;
/// it is disabled and reported rather than aborting the run.
fn active_constraints(
    network: &TaskNetwork,
    order: &[i32],
    project_start: NaiveDateTime,
) -> (FxHashMap<i32, DateConstraint>, Vec<Diagnostic>) {
    let mut active: FxHashMap<i32, DateConstraint> = FxHashMap::default();
    let mut diagnostics = Vec::new();

    for &task_id in order {
        let Some(task) = network.task(task_id) else {
            continue;
        };
        let Some(constraint) = task.constraint else {
            continue;
        };
        let reason = if task.status == TaskStatus::Complete {
            Some("constraint on a completed task")
        } else if constraint.kind == ConstraintKind::FinishNoLater
            && constraint.date < project_start
        {
            Some("finish-no-later date precedes the project start")
        } else {
            None
        };
        match reason {
            Some(reason) => {
                warn!(task_id = task.id, reason, "ignoring constraint");
                diagnostics.push(Diagnostic::InvalidConstraint {
                    task_id: task.id,
                    reason: reason.to_string(),
                });
            }
            None => {
                active.insert(task.id, constraint);
            }
        }
    }

    (active, diagnostics)
}
