use crate::error::CalendarError;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A contiguous working window within one day, half-open `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPeriod {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl WorkPeriod {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    fn seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

/// Work-time model: a weekly template of work periods plus date exceptions.
///
/// An exception entirely overrides the weekday template for its date; an
/// exception with no periods marks the date non-working. A duration that is
/// exhausted exactly at the end of a work period resolves to the end of that
/// period, never the start of the next one; the backward walk mirrors this
/// at period starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    weekly: [Vec<WorkPeriod>; 7],
    exceptions: HashMap<NaiveDate, Vec<WorkPeriod>>,
    hours_per_day: f64,
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn new(
        weekly: HashMap<Weekday, Vec<WorkPeriod>>,
        exceptions: HashMap<NaiveDate, Vec<WorkPeriod>>,
        hours_per_day: f64,
    ) -> Result<Self, CalendarError> {
        if !(hours_per_day > 0.0) {
            return Err(CalendarError::NonPositiveHours(hours_per_day));
        }

        let mut template: [Vec<WorkPeriod>; 7] = Default::default();
        for day in Self::ALL_WEEKDAYS {
            if let Some(periods) = weekly.get(&day) {
                Self::validate_periods(periods, &day.to_string())?;
                template[day.num_days_from_monday() as usize] = periods.clone();
            }
        }
        if template.iter().all(|periods| periods.is_empty()) {
            return Err(CalendarError::EmptyWeek);
        }

        for (date, periods) in &exceptions {
            Self::validate_periods(periods, &date.to_string())?;
        }

        Ok(Self {
            weekly: template,
            exceptions,
            hours_per_day,
        })
    }

    /// Mon-Fri calendar with a single work period per day.
    pub fn standard_week(
        start: NaiveTime,
        end: NaiveTime,
        hours_per_day: f64,
    ) -> Result<Self, CalendarError> {
        let period = WorkPeriod::new(start, end);
        let weekly = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ]
        .into_iter()
        .map(|day| (day, vec![period]))
        .collect();
        Self::new(weekly, HashMap::new(), hours_per_day)
    }

    /// Mark a date as non-working (overrides the weekday template).
    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.exceptions.insert(date, Vec::new());
    }

    /// Replace the work periods for a single date.
    pub fn add_exception(&mut self, date: NaiveDate, periods: Vec<WorkPeriod>) {
        self.exceptions.insert(date, periods);
    }

    fn validate_periods(periods: &[WorkPeriod], context: &str) -> Result<(), CalendarError> {
        for period in periods {
            if period.start >= period.end {
                return Err(CalendarError::EmptyPeriod {
                    start: period.start,
                    end: period.end,
                });
            }
        }
        for pair in periods.windows(2) {
            if pair[0].end > pair[1].start {
                return Err(CalendarError::OverlappingPeriods {
                    context: context.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn hours_per_day(&self) -> f64 {
        self.hours_per_day
    }

    fn periods_on(&self, date: NaiveDate) -> &[WorkPeriod] {
        match self.exceptions.get(&date) {
            Some(periods) => periods,
            None => &self.weekly[date.weekday().num_days_from_monday() as usize],
        }
    }

    pub fn is_work_day(&self, date: NaiveDate) -> bool {
        !self.periods_on(date).is_empty()
    }

    pub fn work_hours_on(&self, date: NaiveDate) -> f64 {
        let seconds: i64 = self.periods_on(date).iter().map(WorkPeriod::seconds).sum();
        Self::secs_to_hours(seconds)
    }

    /// Walk forward from `start`, consuming work seconds until `hours` is
    /// exhausted. Non-working dates contribute nothing and are skipped.
    /// `hours <= 0` returns `start` unchanged.
    pub fn add_work_hours(&self, start: NaiveDateTime, hours: f64) -> NaiveDateTime {
        let mut remaining = Self::hours_to_secs(hours);
        if remaining <= 0 {
            return start;
        }

        let mut date = start.date();
        let mut floor = Some(start);
        loop {
            for period in self.periods_on(date) {
                let mut from = date.and_time(period.start);
                let until = date.and_time(period.end);
                if let Some(f) = floor {
                    if until <= f {
                        continue;
                    }
                    if from < f {
                        from = f;
                    }
                }
                let available = (until - from).num_seconds();
                if available >= remaining {
                    return from + Duration::seconds(remaining);
                }
                remaining -= available;
            }
            date = date.succ_opt().expect("calendar walked past end of date range");
            floor = None;
        }
    }

    /// Mirror of `add_work_hours`, walking backward from `end`.
    pub fn subtract_work_hours(&self, end: NaiveDateTime, hours: f64) -> NaiveDateTime {
        let mut remaining = Self::hours_to_secs(hours);
        if remaining <= 0 {
            return end;
        }

        let mut date = end.date();
        let mut ceiling = Some(end);
        loop {
            for period in self.periods_on(date).iter().rev() {
                let from = date.and_time(period.start);
                let mut until = date.and_time(period.end);
                if let Some(c) = ceiling {
                    if from >= c {
                        continue;
                    }
                    if until > c {
                        until = c;
                    }
                }
                let available = (until - from).num_seconds();
                if available >= remaining {
                    return until - Duration::seconds(remaining);
                }
                remaining -= available;
            }
            date = date.pred_opt().expect("calendar walked past start of date range");
            ceiling = None;
        }
    }

    /// Signed work hours from `start` to `end`; negative when `end < start`.
    ///
    /// For `end >= start` with both endpoints inside work time,
    /// `add_work_hours(start, work_hours_between(start, end)) == end`.
    pub fn work_hours_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> f64 {
        if end < start {
            return -self.work_hours_between(end, start);
        }

        let mut total = 0i64;
        let mut date = start.date();
        while date <= end.date() {
            for period in self.periods_on(date) {
                let from = date.and_time(period.start).max(start);
                let until = date.and_time(period.end).min(end);
                if until > from {
                    total += (until - from).num_seconds();
                }
            }
            date = date.succ_opt().expect("calendar walked past end of date range");
        }
        Self::secs_to_hours(total)
    }

    fn hours_to_secs(hours: f64) -> i64 {
        (hours * 3600.0).round() as i64
    }

    fn secs_to_hours(seconds: i64) -> f64 {
        seconds as f64 / 3600.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eight_to_five() -> WorkCalendar {
        WorkCalendar::standard_week(
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            8.0,
        )
        .unwrap()
    }

    #[test]
    fn rejects_overlapping_periods() {
        let periods = vec![
            WorkPeriod::new(
                NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            ),
            WorkPeriod::new(
                NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            ),
        ];
        let weekly = HashMap::from([(Weekday::Mon, periods)]);
        assert!(matches!(
            WorkCalendar::new(weekly, HashMap::new(), 8.0),
            Err(CalendarError::OverlappingPeriods { .. })
        ));
    }

    #[test]
    fn exception_overrides_weekday_template() {
        let mut cal = eight_to_five();
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        cal.add_holiday(monday);
        assert!(!cal.is_work_day(monday));
        assert_eq!(cal.work_hours_on(monday), 0.0);
    }

    #[test]
    fn zero_hour_add_returns_input() {
        let cal = eight_to_five();
        // Saturday noon, outside any work period
        let t = NaiveDate::from_ymd_opt(2025, 1, 4)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(cal.add_work_hours(t, 0.0), t);
        assert_eq!(cal.subtract_work_hours(t, 0.0), t);
    }
}
