use super::finishing_calendar;
use crate::engine;
use crate::error::ScheduleError;
use crate::graph::TaskNetwork;
use crate::task::{CalendarSet, Task};
use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayContribution {
    pub code: String,
    pub name: String,
    pub delta_hours: f64,
}

/// Cross-snapshot slip attribution. Contributions are an additive
/// heuristic — each currently-critical task's duration growth counted
/// independently — not a forensic delay analysis; concurrent critical paths
/// over-count and second-order effects are not modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayAttributionResult {
    pub baseline_snapshot: String,
    pub current_snapshot: String,
    pub baseline_finish: NaiveDateTime,
    pub current_finish: NaiveDateTime,
    /// Work-hours between the two finishes, on the current snapshot's
    /// finishing calendar.
    pub total_slip_hours: f64,
    /// Ranked descending by delta, ties by code.
    pub contributions: Vec<DelayContribution>,
    /// Natural keys present only in the current snapshot.
    pub added: Vec<String>,
    /// Natural keys present only in the baseline snapshot.
    pub removed: Vec<String>,
}

/// Compare two independently loaded snapshots of the same schedule and rank
/// the tasks contributing to the slip. Tasks are matched by natural key;
/// snapshot-local ids are never compared across snapshots.
pub fn attribute_delays(
    baseline_network: &TaskNetwork,
    baseline_calendars: &CalendarSet,
    current_network: &TaskNetwork,
    current_calendars: &CalendarSet,
) -> Result<DelayAttributionResult, ScheduleError> {
    // Independent snapshots, independent networks: the two runs share no
    // mutable state.
    let (baseline, current) = rayon::join(
        || engine::run(baseline_network, baseline_calendars, None),
        || engine::run(current_network, current_calendars, None),
    );
    let baseline = baseline?;
    let current = current?;

    let baseline_by_code: FxHashMap<&str, &Task> = baseline
        .tasks
        .iter()
        .map(|task| (task.code.as_str(), task))
        .collect();
    let current_by_code: FxHashMap<&str, &Task> = current
        .tasks
        .iter()
        .map(|task| (task.code.as_str(), task))
        .collect();

    let mut contributions: Vec<DelayContribution> = Vec::new();
    for task in &current.tasks {
        let Some(baseline_task) = baseline_by_code.get(task.code.as_str()) else {
            continue;
        };
        let delta_hours = task.duration_hours - baseline_task.duration_hours;
        if delta_hours > 0.0 && task.is_critical == Some(true) {
            contributions.push(DelayContribution {
                code: task.code.clone(),
                name: task.name.clone(),
                delta_hours,
            });
        }
    }
    contributions.sort_by(|a, b| {
        b.delta_hours
            .partial_cmp(&a.delta_hours)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.code.cmp(&b.code))
    });

    let mut added: Vec<String> = current
        .tasks
        .iter()
        .filter(|task| !baseline_by_code.contains_key(task.code.as_str()))
        .map(|task| task.code.clone())
        .collect();
    added.sort();
    let mut removed: Vec<String> = baseline
        .tasks
        .iter()
        .filter(|task| !current_by_code.contains_key(task.code.as_str()))
        .map(|task| task.code.clone())
        .collect();
    removed.sort();

    let total_slip_hours = match finishing_calendar(&current, current_calendars) {
        Some(calendar) => {
            calendar.work_hours_between(baseline.project_finish, current.project_finish)
        }
        None => 0.0,
    };

    debug!(
        baseline = baseline.snapshot.as_str(),
        current = current.snapshot.as_str(),
        total_slip_hours,
        contributors = contributions.len(),
        "delay attribution complete"
    );

    Ok(DelayAttributionResult {
        baseline_snapshot: baseline.snapshot,
        current_snapshot: current.snapshot,
        baseline_finish: baseline.project_finish,
        current_finish: current.project_finish,
        total_slip_hours,
        contributions,
        added,
        removed,
    })
}
