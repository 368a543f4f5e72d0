pub mod attribution;
pub mod critical_path;
pub mod impact;

pub use attribution::{attribute_delays, DelayAttributionResult, DelayContribution};
pub use critical_path::{analyze_critical_path, CriticalPathResult, FloatBucket, NearCriticalTask};
pub use impact::{analyze_task_impact, TaskImpactResult};

use crate::calendar::WorkCalendar;
use crate::engine::CpmResult;
use crate::task::CalendarSet;

/// Calendar on which a result's project finish was measured; slips between
/// runs are expressed in this calendar's work hours.
pub(crate) fn finishing_calendar<'a>(
    result: &CpmResult,
    calendars: &'a CalendarSet,
) -> Option<&'a WorkCalendar> {
    result
        .finishing_calendar_id()
        .and_then(|calendar_id| calendars.get(calendar_id))
}
