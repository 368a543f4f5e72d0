use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use schedule_cpm::{
    analyze_critical_path, analyze_task_impact, attribute_delays, CalendarSet, Dependency,
    ScheduleError, Task, TaskNetwork, TaskStatus, WorkCalendar, WorkPeriod,
};
use std::collections::HashMap;

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

fn monday() -> NaiveDateTime {
    dt(2025, 1, 6, 8, 0)
}

fn calendars() -> CalendarSet {
    let periods = vec![
        WorkPeriod::new(t(8, 0), t(12, 0)),
        WorkPeriod::new(t(13, 0), t(17, 0)),
    ];
    let weekly: HashMap<Weekday, Vec<WorkPeriod>> = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ]
    .into_iter()
    .map(|day| (day, periods.clone()))
    .collect();
    let mut set = CalendarSet::new();
    set.insert(1, WorkCalendar::new(weekly, HashMap::new(), 8.0).unwrap());
    set
}

fn task(id: i32, code: &str, hours: f64) -> Task {
    Task::new(id, code, format!("Task {code}"), hours, 1)
}

fn chain(snapshot: &str) -> TaskNetwork {
    let mut network = TaskNetwork::new(snapshot);
    network.add_task(task(1, "A", 8.0)).unwrap();
    network.add_task(task(2, "B", 8.0)).unwrap();
    network.add_task(task(3, "C", 8.0)).unwrap();
    network.add_dependency(Dependency::finish_to_start(1, 2));
    network.add_dependency(Dependency::finish_to_start(2, 3));
    network
}

#[test]
fn critical_path_partitions_and_buckets() {
    let mut network = chain("baseline");
    network.add_task(task(4, "D", 16.0)).unwrap(); // float 8
    network.add_task(task(5, "F", 20.0)).unwrap(); // float 4

    let result = analyze_critical_path(&network, &calendars(), 8.0).unwrap();

    assert_eq!(result.critical, vec![1, 2, 3]);
    // ascending by float
    let near: Vec<(i32, f64)> = result
        .near_critical
        .iter()
        .map(|n| (n.id, n.float_hours))
        .collect();
    assert_eq!(near, vec![(5, 4.0), (4, 8.0)]);

    let counts: HashMap<&str, usize> = result
        .histogram
        .iter()
        .map(|bucket| (bucket.label.as_str(), bucket.count))
        .collect();
    assert_eq!(counts["0"], 3);
    assert_eq!(counts["0-8"], 2);
    assert_eq!(counts["8-40"], 0);
    assert_eq!(counts["40-80"], 0);
    assert_eq!(counts[">80"], 0);
}

#[test]
fn near_critical_respects_threshold() {
    let mut network = chain("baseline");
    network.add_task(task(4, "D", 16.0)).unwrap(); // float 8

    let result = analyze_critical_path(&network, &calendars(), 4.0).unwrap();
    assert!(result.near_critical.is_empty());
}

#[test]
fn impact_of_growing_a_critical_task() {
    let network = chain("baseline");
    let result =
        analyze_task_impact(&network, &calendars(), 2, 16.0, Some(monday())).unwrap();

    assert_eq!(result.baseline_finish, dt(2025, 1, 8, 17, 0));
    assert_eq!(result.modified_finish, dt(2025, 1, 10, 17, 0));
    assert_eq!(result.slip_hours, 16.0);
    assert_eq!(result.affected_tasks, vec![2, 3]);
    assert_eq!(result.baseline_critical_path, vec![1, 2, 3]);
    assert_eq!(result.modified_critical_path, vec![1, 2, 3]);

    // clone-before-mutate: the baseline network is untouched
    assert_eq!(network.task(2).unwrap().duration_hours, 8.0);
}

#[test]
fn impact_within_float_does_not_move_finish() {
    let mut network = chain("baseline");
    network.add_task(task(4, "D", 16.0)).unwrap(); // float 8

    let result =
        analyze_task_impact(&network, &calendars(), 4, 4.0, Some(monday())).unwrap();
    assert_eq!(result.slip_hours, 0.0);
    assert_eq!(result.modified_finish, result.baseline_finish);
    assert_eq!(result.affected_tasks, vec![4]);
}

#[test]
fn impact_beyond_float_slips_and_shifts_criticality() {
    let mut network = chain("baseline");
    network.add_task(task(4, "D", 16.0)).unwrap(); // float 8

    let result =
        analyze_task_impact(&network, &calendars(), 4, 12.0, Some(monday())).unwrap();
    assert!(result.slip_hours > 0.0);
    assert!(result.modified_finish > result.baseline_finish);
    assert!(result.modified_critical_path.contains(&4));
    assert!(!result.baseline_critical_path.contains(&4));
}

#[test]
fn impact_on_unknown_task_is_an_error() {
    let network = chain("baseline");
    assert!(matches!(
        analyze_task_impact(&network, &calendars(), 99, 8.0, Some(monday())),
        Err(ScheduleError::UnknownTask { task_id: 99 })
    ));
}

fn mark_complete(network: &mut TaskNetwork, task_id: i32) {
    let a = network.task_mut(task_id).unwrap();
    a.status = TaskStatus::Complete;
    a.actual_start = Some(monday());
    a.actual_finish = Some(dt(2025, 1, 6, 17, 0));
}

#[test]
fn attribution_ranks_the_grown_critical_task() {
    // snapshot-local ids differ on purpose; matching is by code
    let mut baseline = chain("update-03");
    mark_complete(&mut baseline, 1);
    baseline.add_task(task(5, "E", 4.0)).unwrap();

    let mut current = TaskNetwork::new("update-04");
    current.add_task(task(11, "A", 8.0)).unwrap();
    current.add_task(task(12, "B", 24.0)).unwrap();
    current.add_task(task(13, "C", 8.0)).unwrap();
    current.add_dependency(Dependency::finish_to_start(11, 12));
    current.add_dependency(Dependency::finish_to_start(12, 13));
    mark_complete(&mut current, 11);
    current.add_task(task(14, "D", 8.0)).unwrap();

    let calendars = calendars();
    let result = attribute_delays(&baseline, &calendars, &current, &calendars).unwrap();

    assert_eq!(result.baseline_snapshot, "update-03");
    assert_eq!(result.current_snapshot, "update-04");
    assert_eq!(result.baseline_finish, dt(2025, 1, 8, 17, 0));
    assert_eq!(result.current_finish, dt(2025, 1, 10, 17, 0));
    assert_eq!(result.total_slip_hours, 16.0);

    assert_eq!(result.contributions.len(), 1);
    assert_eq!(result.contributions[0].code, "B");
    assert_eq!(result.contributions[0].delta_hours, 16.0);

    assert_eq!(result.added, vec!["D".to_string()]);
    assert_eq!(result.removed, vec!["E".to_string()]);
}

#[test]
fn attribution_of_identical_snapshots_is_empty() {
    let mut baseline = chain("update-03");
    mark_complete(&mut baseline, 1);
    let mut current = chain("update-04");
    mark_complete(&mut current, 1);

    let calendars = calendars();
    let result = attribute_delays(&baseline, &calendars, &current, &calendars).unwrap();

    assert_eq!(result.total_slip_hours, 0.0);
    assert!(result.contributions.is_empty());
    assert!(result.added.is_empty());
    assert!(result.removed.is_empty());
}
