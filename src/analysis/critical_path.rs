use crate::engine::{self, CpmResult};
use crate::error::ScheduleError;
use crate::graph::TaskNetwork;
use crate::task::CalendarSet;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearCriticalTask {
    pub id: i32,
    pub float_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatBucket {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalPathResult {
    pub snapshot: String,
    /// Critical task ids in execution (early start) order.
    pub critical: Vec<i32>,
    /// Tasks with 0 < float <= threshold, ascending by float.
    pub near_critical: Vec<NearCriticalTask>,
    pub histogram: Vec<FloatBucket>,
    pub project_finish: NaiveDateTime,
}

// Reporting buckets in work-hours: critical, up to a day, a week, two
// weeks, beyond.
const BUCKET_BOUNDS: [(&str, f64); 4] = [
    ("0", 0.0),
    ("0-8", 8.0),
    ("8-40", 40.0),
    ("40-80", 80.0),
];
const OVERFLOW_LABEL: &str = ">80";

/// Partition a CPM run into critical / near-critical / float buckets.
pub fn analyze_critical_path(
    network: &TaskNetwork,
    calendars: &CalendarSet,
    near_critical_threshold_hours: f64,
) -> Result<CriticalPathResult, ScheduleError> {
    let result = engine::run(network, calendars, None)?;
    Ok(partition(&result, near_critical_threshold_hours))
}

pub(crate) fn partition(
    result: &CpmResult,
    near_critical_threshold_hours: f64,
) -> CriticalPathResult {
    let mut near_critical: Vec<NearCriticalTask> = Vec::new();
    let mut counts = vec![0usize; BUCKET_BOUNDS.len() + 1];

    for task in &result.tasks {
        let float_hours = task.total_float_hours.unwrap_or(0.0);
        if float_hours > 0.0 && float_hours <= near_critical_threshold_hours {
            near_critical.push(NearCriticalTask {
                id: task.id,
                float_hours,
            });
        }
        let bucket = BUCKET_BOUNDS
            .iter()
            .position(|&(_, upper)| float_hours <= upper)
            .unwrap_or(BUCKET_BOUNDS.len());
        counts[bucket] += 1;
    }

    near_critical.sort_by(|a, b| {
        a.float_hours
            .partial_cmp(&b.float_hours)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });

    let histogram = BUCKET_BOUNDS
        .iter()
        .map(|&(label, _)| label)
        .chain(std::iter::once(OVERFLOW_LABEL))
        .zip(counts)
        .map(|(label, count)| FloatBucket {
            label: label.to_string(),
            count,
        })
        .collect();

    CriticalPathResult {
        snapshot: result.snapshot.clone(),
        critical: result.critical_path.clone(),
        near_critical,
        histogram,
        project_finish: result.project_finish,
    }
}
