pub mod analysis;
pub mod calculations;
pub mod calendar;
pub mod engine;
pub mod error;
pub mod graph;
pub mod task;

pub use analysis::{
    analyze_critical_path, analyze_task_impact, attribute_delays, CriticalPathResult,
    DelayAttributionResult, DelayContribution, FloatBucket, NearCriticalTask, TaskImpactResult,
};
pub use calendar::{WorkCalendar, WorkPeriod};
pub use engine::{run, CpmResult};
pub use error::{CalendarError, Diagnostic, ScheduleError, TaskValidationError};
pub use graph::TaskNetwork;
pub use task::{
    CalendarSet, ConstraintKind, DateConstraint, Dependency, DependencyKind, Task, TaskKind,
    TaskStatus,
};
