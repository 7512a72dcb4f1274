use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::timezone::ScheduleTimeZone;

/// A recurring calendar pattern: optional minute, hour, day and month
/// constraints evaluated in a fixed [`ScheduleTimeZone`].
///
/// Every field is independently optional; an unset field matches every
/// value. Out-of-range values and the day_of_week/day_of_month conflict are
/// rejected by the setters; an impossible month/day_of_month combination is
/// rejected by [`next_occurrence`](Self::next_occurrence) (or up front via
/// [`validate`](Self::validate)).
///
/// A schedule handed to a running job must not be mutated concurrently;
/// jobs take ownership of their schedule at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleSpec", into = "ScheduleSpec")]
pub struct Schedule {
    timezone: ScheduleTimeZone,
    minute: Option<u32>,
    hour: Option<u32>,
    day_of_week: Option<u32>,
    day_of_month: Option<u32>,
    month: Option<u32>,
}

impl Schedule {
    /// A schedule with every field unconstrained, in the local zone.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timezone(&self) -> ScheduleTimeZone {
        self.timezone
    }

    pub fn minute(&self) -> Option<u32> {
        self.minute
    }

    pub fn hour(&self) -> Option<u32> {
        self.hour
    }

    pub fn day_of_week(&self) -> Option<u32> {
        self.day_of_week
    }

    pub fn day_of_month(&self) -> Option<u32> {
        self.day_of_month
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    /// Evaluate calendar fields in `value` instead of the local zone.
    pub fn set_timezone(&mut self, value: ScheduleTimeZone) -> &mut Self {
        self.timezone = value;
        self
    }

    /// Constrain the minute of the hour, `0..=59`.
    pub fn set_minute(&mut self, value: u32) -> Result<&mut Self> {
        check_range("minute", value, 0, 59)?;
        self.minute = Some(value);
        Ok(self)
    }

    /// Constrain the hour of the day, `0..=23`.
    pub fn set_hour(&mut self, value: u32) -> Result<&mut Self> {
        check_range("hour", value, 0, 23)?;
        self.hour = Some(value);
        Ok(self)
    }

    /// Constrain the ISO weekday, `1..=7` where 1 is Monday and 7 is Sunday.
    ///
    /// Mutually exclusive with [`set_day_of_month`](Self::set_day_of_month);
    /// on conflict the already-set field is left unchanged.
    pub fn set_day_of_week(&mut self, value: u32) -> Result<&mut Self> {
        check_range("day_of_week", value, 1, 7)?;
        if self.day_of_month.is_some() {
            return Err(ScheduleError::DayOfWeekConflict);
        }
        self.day_of_week = Some(value);
        Ok(self)
    }

    /// Constrain the day of the month, `1..=31`.
    ///
    /// Mutually exclusive with [`set_day_of_week`](Self::set_day_of_week);
    /// on conflict the already-set field is left unchanged.
    pub fn set_day_of_month(&mut self, value: u32) -> Result<&mut Self> {
        check_range("day_of_month", value, 1, 31)?;
        if self.day_of_week.is_some() {
            return Err(ScheduleError::DayOfMonthConflict);
        }
        self.day_of_month = Some(value);
        Ok(self)
    }

    /// Constrain the month, `1..=12`.
    pub fn set_month(&mut self, value: u32) -> Result<&mut Self> {
        check_range("month", value, 1, 12)?;
        self.month = Some(value);
        Ok(self)
    }

    /// Check that the month/day_of_month combination can occur at all.
    ///
    /// Feb 29 is always accepted: leap years recur, so such a schedule
    /// simply produces no occurrence in common years.
    pub fn validate(&self) -> Result<()> {
        if let (Some(month), Some(day)) = (self.month, self.day_of_month) {
            if month == 2 && day == 29 {
                return Ok(());
            }
            if day > days_in_month(month) {
                return Err(ScheduleError::ImpossibleDayOfMonth { month, day });
            }
        }
        Ok(())
    }

    /// Earliest instant strictly after `reference` satisfying every
    /// constrained field.
    ///
    /// The reference is truncated to whole minutes and advanced by one
    /// minute first, since occurrences are checked on a one-minute grid. The
    /// search advances the candidate most-significant field first, so each
    /// step either satisfies a coarser field or strictly advances coarser
    /// time, which rules out cycling.
    pub fn next_occurrence(&self, reference: DateTime<Utc>) -> Result<DateTime<Utc>> {
        self.validate()?;

        let local = self.timezone.to_local(reference);
        let mut candidate = local
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(local)
            + Duration::minutes(1);

        loop {
            if let Some(month) = self.month {
                if candidate.month() != month {
                    candidate = first_of_next_month(candidate);
                    continue;
                }
            }
            if let Some(day) = self.day_of_month {
                if candidate.day() != day {
                    candidate = midnight_next_day(candidate);
                    continue;
                }
            }
            if let Some(weekday) = self.day_of_week {
                if candidate.weekday().number_from_monday() != weekday {
                    candidate = midnight_next_day(candidate);
                    continue;
                }
            }
            if let Some(hour) = self.hour {
                if candidate.hour() != hour {
                    candidate = top_of_next_hour(candidate);
                    continue;
                }
            }
            if let Some(minute) = self.minute {
                if candidate.minute() != minute {
                    candidate += Duration::minutes(1);
                    continue;
                }
            }
            match self.timezone.from_local(candidate) {
                Some(instant) => return Ok(instant),
                // DST gap: this local minute does not exist. Step past it.
                None => candidate += Duration::minutes(1),
            }
        }
    }
}

/// Plain serde mirror of [`Schedule`].
///
/// Deserialization routes through the setters, so configuration files
/// cannot bypass the set-time invariants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleSpec {
    #[serde(default)]
    pub timezone: ScheduleTimeZone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
}

impl TryFrom<ScheduleSpec> for Schedule {
    type Error = ScheduleError;

    fn try_from(spec: ScheduleSpec) -> Result<Self> {
        let mut schedule = Schedule::new();
        schedule.set_timezone(spec.timezone);
        if let Some(value) = spec.minute {
            schedule.set_minute(value)?;
        }
        if let Some(value) = spec.hour {
            schedule.set_hour(value)?;
        }
        if let Some(value) = spec.day_of_week {
            schedule.set_day_of_week(value)?;
        }
        if let Some(value) = spec.day_of_month {
            schedule.set_day_of_month(value)?;
        }
        if let Some(value) = spec.month {
            schedule.set_month(value)?;
        }
        Ok(schedule)
    }
}

impl From<Schedule> for ScheduleSpec {
    fn from(schedule: Schedule) -> Self {
        Self {
            timezone: schedule.timezone,
            minute: schedule.minute,
            hour: schedule.hour,
            day_of_week: schedule.day_of_week,
            day_of_month: schedule.day_of_month,
            month: schedule.month,
        }
    }
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<()> {
    if value < min || value > max {
        return Err(ScheduleError::FieldOutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Day count for `month` in a common year. Feb 29 is special-cased by the
/// caller before this is consulted.
fn days_in_month(month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => 28,
    }
}

fn first_of_next_month(t: NaiveDateTime) -> NaiveDateTime {
    let (year, month) = if t.month() == 12 {
        (t.year() + 1, 1)
    } else {
        (t.year(), t.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .expect("first of month is a valid date")
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
}

fn midnight_next_day(t: NaiveDateTime) -> NaiveDateTime {
    t.date()
        .succ_opt()
        .expect("next day within calendar range")
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
}

fn top_of_next_hour(t: NaiveDateTime) -> NaiveDateTime {
    (t + Duration::hours(1)).with_minute(0).expect("minute 0 is valid")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn dt(value: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
            .expect("test datetime")
            .and_utc()
    }

    /// Schedule pinned to UTC so the vectors are host-independent.
    fn utc_schedule() -> Schedule {
        let mut schedule = Schedule::new();
        schedule.set_timezone(ScheduleTimeZone::Utc);
        schedule
    }

    #[test]
    fn unconstrained_advances_one_minute() {
        let schedule = utc_schedule();
        let next = schedule.next_occurrence(dt("2018-11-09 22:28")).unwrap();
        assert_eq!(next, dt("2018-11-09 22:29"));
    }

    #[test]
    fn reference_seconds_are_truncated() {
        let schedule = utc_schedule();
        let reference = Utc.with_ymd_and_hms(2018, 11, 9, 22, 28, 45).unwrap();
        let next = schedule.next_occurrence(reference).unwrap();
        assert_eq!(next, dt("2018-11-09 22:29"));
    }

    #[test]
    fn minute_rolls_to_next_hour() {
        let mut schedule = utc_schedule();
        schedule.set_minute(1).unwrap();
        let next = schedule.next_occurrence(dt("2018-11-09 22:28")).unwrap();
        assert_eq!(next, dt("2018-11-09 23:01"));
    }

    #[test]
    fn hour_ahead_same_day() {
        let mut schedule = utc_schedule();
        schedule.set_hour(23).unwrap();
        let next = schedule.next_occurrence(dt("2018-11-09 22:28")).unwrap();
        assert_eq!(next, dt("2018-11-09 23:00"));
    }

    #[test]
    fn within_matching_hour_next_minute_fires() {
        let mut schedule = utc_schedule();
        schedule.set_hour(23).unwrap();
        let next = schedule.next_occurrence(dt("2018-11-09 23:50")).unwrap();
        assert_eq!(next, dt("2018-11-09 23:51"));
    }

    #[test]
    fn end_of_matching_hour_rolls_to_next_day() {
        let mut schedule = utc_schedule();
        schedule.set_hour(23).unwrap();
        let next = schedule.next_occurrence(dt("2018-11-09 23:59")).unwrap();
        assert_eq!(next, dt("2018-11-10 23:00"));
    }

    #[test]
    fn weekday_ahead_in_week() {
        // 2018-11-12 is a Monday; weekday 5 is the coming Friday.
        let mut schedule = utc_schedule();
        schedule.set_day_of_week(5).unwrap();
        let next = schedule.next_occurrence(dt("2018-11-12 23:50")).unwrap();
        assert_eq!(next, dt("2018-11-16 00:00"));
    }

    #[test]
    fn matching_weekday_next_minute_fires() {
        let mut schedule = utc_schedule();
        schedule.set_day_of_week(1).unwrap();
        let next = schedule.next_occurrence(dt("2018-11-12 23:50")).unwrap();
        assert_eq!(next, dt("2018-11-12 23:51"));
    }

    #[test]
    fn end_of_matching_weekday_rolls_a_full_week() {
        let mut schedule = utc_schedule();
        schedule.set_day_of_week(1).unwrap();
        let next = schedule.next_occurrence(dt("2018-11-12 23:59")).unwrap();
        assert_eq!(next, dt("2018-11-19 00:00"));
    }

    #[test]
    fn matching_sunday_next_minute_fires() {
        // 2018-11-18 is a Sunday.
        let mut schedule = utc_schedule();
        schedule.set_day_of_week(7).unwrap();
        let next = schedule.next_occurrence(dt("2018-11-18 23:50")).unwrap();
        assert_eq!(next, dt("2018-11-18 23:51"));
    }

    #[test]
    fn end_of_sunday_rolls_a_full_week() {
        let mut schedule = utc_schedule();
        schedule.set_day_of_week(7).unwrap();
        let next = schedule.next_occurrence(dt("2018-11-18 23:59")).unwrap();
        assert_eq!(next, dt("2018-11-25 00:00"));
    }

    #[test]
    fn sunday_from_midweek() {
        let mut schedule = utc_schedule();
        schedule.set_day_of_week(7).unwrap();
        let next = schedule.next_occurrence(dt("2018-11-15 23:59")).unwrap();
        assert_eq!(next, dt("2018-11-18 00:00"));
    }

    #[test]
    fn day_of_month_ahead_rolls_to_next_month() {
        let mut schedule = utc_schedule();
        schedule.set_day_of_month(1).unwrap();
        let next = schedule.next_occurrence(dt("2018-11-12 23:50")).unwrap();
        assert_eq!(next, dt("2018-12-01 00:00"));
    }

    #[test]
    fn matching_day_of_month_next_minute_fires() {
        let mut schedule = utc_schedule();
        schedule.set_day_of_month(12).unwrap();
        let next = schedule.next_occurrence(dt("2018-11-12 23:50")).unwrap();
        assert_eq!(next, dt("2018-11-12 23:51"));
    }

    #[test]
    fn end_of_matching_day_rolls_a_month() {
        let mut schedule = utc_schedule();
        schedule.set_day_of_month(12).unwrap();
        let next = schedule.next_occurrence(dt("2018-11-12 23:59")).unwrap();
        assert_eq!(next, dt("2018-12-12 00:00"));
    }

    #[test]
    fn month_ahead_starts_at_its_first_minute() {
        let mut schedule = utc_schedule();
        schedule.set_month(11).unwrap();
        let next = schedule.next_occurrence(dt("2018-10-12 23:59")).unwrap();
        assert_eq!(next, dt("2018-11-01 00:00"));
    }

    #[test]
    fn inside_matching_month_next_minute_fires() {
        let mut schedule = utc_schedule();
        schedule.set_month(10).unwrap();
        let next = schedule.next_occurrence(dt("2018-10-12 23:59")).unwrap();
        assert_eq!(next, dt("2018-10-13 00:00"));
    }

    #[test]
    fn end_of_matching_month_rolls_a_year() {
        let mut schedule = utc_schedule();
        schedule.set_month(11).unwrap();
        let next = schedule.next_occurrence(dt("2018-11-30 23:59")).unwrap();
        assert_eq!(next, dt("2019-11-01 00:00"));
    }

    #[test]
    fn hour_and_minute_later_today() {
        let mut schedule = utc_schedule();
        schedule.set_hour(12).unwrap().set_minute(12).unwrap();
        let next = schedule.next_occurrence(dt("2018-11-30 01:59")).unwrap();
        assert_eq!(next, dt("2018-11-30 12:12"));
    }

    #[test]
    fn exact_match_rolls_to_next_day() {
        let mut schedule = utc_schedule();
        schedule.set_hour(12).unwrap().set_minute(12).unwrap();
        let next = schedule.next_occurrence(dt("2018-11-30 12:12")).unwrap();
        assert_eq!(next, dt("2018-12-01 12:12"));
    }

    #[test]
    fn day_and_month_roll_into_next_year() {
        let mut schedule = utc_schedule();
        schedule.set_day_of_month(12).unwrap().set_month(1).unwrap();
        let next = schedule.next_occurrence(dt("2018-11-30 12:12")).unwrap();
        assert_eq!(next, dt("2019-01-12 00:00"));
    }

    #[test]
    fn day_hour_minute_combination() {
        let mut schedule = utc_schedule();
        schedule
            .set_hour(12)
            .unwrap()
            .set_minute(12)
            .unwrap()
            .set_day_of_month(14)
            .unwrap();
        let next = schedule.next_occurrence(dt("2018-11-30 12:12")).unwrap();
        assert_eq!(next, dt("2018-12-14 12:12"));
    }

    #[test]
    fn weekday_hour_minute_combination() {
        // 2018-11-13 is a Tuesday; weekday 6 is the coming Saturday.
        let mut schedule = utc_schedule();
        schedule
            .set_hour(12)
            .unwrap()
            .set_minute(12)
            .unwrap()
            .set_day_of_week(6)
            .unwrap();
        let next = schedule.next_occurrence(dt("2018-11-13 12:12")).unwrap();
        assert_eq!(next, dt("2018-11-17 12:12"));
    }

    #[test]
    fn month_day_hour_minute_combination() {
        let mut schedule = utc_schedule();
        schedule
            .set_hour(12)
            .unwrap()
            .set_minute(12)
            .unwrap()
            .set_day_of_month(6)
            .unwrap()
            .set_month(1)
            .unwrap();
        let next = schedule.next_occurrence(dt("2018-11-13 12:12")).unwrap();
        assert_eq!(next, dt("2019-01-06 12:12"));
    }

    #[test]
    fn new_year_schedule_skips_exact_reference() {
        let mut schedule = utc_schedule();
        schedule
            .set_hour(0)
            .unwrap()
            .set_minute(0)
            .unwrap()
            .set_day_of_month(1)
            .unwrap()
            .set_month(1)
            .unwrap();
        let next = schedule.next_occurrence(dt("2019-01-01 00:00")).unwrap();
        assert_eq!(next, dt("2020-01-01 00:00"));
    }

    #[test]
    fn leap_day_waits_for_leap_year() {
        let mut schedule = utc_schedule();
        schedule.set_day_of_month(29).unwrap().set_month(2).unwrap();
        let next = schedule.next_occurrence(dt("2018-01-01 00:00")).unwrap();
        assert_eq!(next, dt("2020-02-29 00:00"));
    }

    #[test]
    fn february_31_is_impossible() {
        let mut schedule = utc_schedule();
        schedule.set_day_of_month(31).unwrap().set_month(2).unwrap();
        let err = schedule
            .next_occurrence(dt("2019-01-01 00:00"))
            .unwrap_err();
        assert_eq!(
            err,
            ScheduleError::ImpossibleDayOfMonth { month: 2, day: 31 }
        );
        assert_eq!(err.to_string(), "Month 2 does not have 31 days");
    }

    #[test]
    fn november_31_is_impossible() {
        let mut schedule = utc_schedule();
        schedule.set_day_of_month(31).unwrap().set_month(11).unwrap();
        let err = schedule
            .next_occurrence(dt("2019-01-01 00:00"))
            .unwrap_err();
        assert_eq!(
            err,
            ScheduleError::ImpossibleDayOfMonth { month: 11, day: 31 }
        );
    }

    #[test]
    fn day_of_week_conflicts_with_day_of_month() {
        let mut schedule = utc_schedule();
        schedule.set_day_of_month(31).unwrap();
        let err = schedule.set_day_of_week(2).unwrap_err();
        assert_eq!(err, ScheduleError::DayOfWeekConflict);
        // The already-set field is untouched.
        assert_eq!(schedule.day_of_month(), Some(31));
        assert_eq!(schedule.day_of_week(), None);
    }

    #[test]
    fn day_of_month_conflicts_with_day_of_week() {
        let mut schedule = utc_schedule();
        schedule.set_day_of_week(2).unwrap();
        let err = schedule.set_day_of_month(31).unwrap_err();
        assert_eq!(err, ScheduleError::DayOfMonthConflict);
        assert_eq!(schedule.day_of_week(), Some(2));
        assert_eq!(schedule.day_of_month(), None);
    }

    #[test]
    fn setters_reject_out_of_range_values() {
        let mut schedule = Schedule::new();
        assert!(schedule.set_minute(60).is_err());
        assert!(schedule.set_hour(24).is_err());
        assert!(schedule.set_day_of_week(0).is_err());
        assert!(schedule.set_day_of_week(8).is_err());
        assert!(schedule.set_day_of_month(0).is_err());
        assert!(schedule.set_day_of_month(32).is_err());
        assert!(schedule.set_month(0).is_err());
        assert!(schedule.set_month(13).is_err());
        // Nothing was constrained by the rejected calls.
        assert_eq!(schedule, Schedule::new());
    }

    #[test]
    fn next_is_always_strictly_after_reference() {
        let references = [
            dt("2018-11-09 22:28"),
            dt("2018-12-31 23:59"),
            dt("2019-02-28 00:00"),
        ];
        let mut constrained = utc_schedule();
        constrained.set_hour(0).unwrap().set_minute(0).unwrap();
        for reference in references {
            for schedule in [utc_schedule(), constrained.clone()] {
                let next = schedule.next_occurrence(reference).unwrap();
                assert!(next > reference, "{next} should be after {reference}");
            }
        }
    }

    #[test]
    fn eastern_hour_maps_to_utc() {
        // 9 AM Eastern in June is 13:00 UTC (EDT, UTC-4).
        let mut schedule = Schedule::new();
        schedule.set_timezone(ScheduleTimeZone::Eastern);
        schedule.set_hour(9).unwrap().set_minute(0).unwrap();
        let reference = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let next = schedule.next_occurrence(reference).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 6, 15, 13, 0, 0).unwrap());
    }

    #[test]
    fn spring_forward_gap_is_skipped() {
        // 2:30 AM Eastern does not exist on 2024-03-10; the occurrence lands
        // on the next day (now EDT, so 06:30 UTC).
        let mut schedule = Schedule::new();
        schedule.set_timezone(ScheduleTimeZone::Eastern);
        schedule.set_hour(2).unwrap().set_minute(30).unwrap();
        let reference = Utc.with_ymd_and_hms(2024, 3, 10, 6, 0, 0).unwrap();
        let next = schedule.next_occurrence(reference).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 11, 6, 30, 0).unwrap());
    }

    #[test]
    fn fall_back_overlap_resolves_to_earliest() {
        // 1:30 AM Pacific occurs twice on 2024-11-03; the pre-transition
        // PDT mapping (08:30 UTC) wins over the PST one (09:30 UTC).
        let mut schedule = Schedule::new();
        schedule.set_timezone(ScheduleTimeZone::Pacific);
        schedule.set_hour(1).unwrap().set_minute(30).unwrap();
        let reference = Utc.with_ymd_and_hms(2024, 11, 3, 7, 0, 0).unwrap();
        let next = schedule.next_occurrence(reference).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 11, 3, 8, 30, 0).unwrap());
    }

    #[test]
    fn deserialization_goes_through_setters() {
        let schedule: Schedule =
            serde_json::from_str(r#"{"timezone":"utc","minute":30,"hour":9}"#).unwrap();
        assert_eq!(schedule.timezone(), ScheduleTimeZone::Utc);
        assert_eq!(schedule.minute(), Some(30));
        assert_eq!(schedule.hour(), Some(9));

        // Conflicting day fields are rejected just like direct set calls.
        let err = serde_json::from_str::<Schedule>(r#"{"day_of_week":5,"day_of_month":12}"#);
        assert!(err.is_err());

        // So are out-of-range values.
        let err = serde_json::from_str::<Schedule>(r#"{"month":13}"#);
        assert!(err.is_err());
    }

    #[test]
    fn serialization_round_trips() {
        let mut schedule = utc_schedule();
        schedule.set_day_of_month(14).unwrap().set_hour(6).unwrap();
        let json = serde_json::to_string(&schedule).unwrap();
        let back: Schedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schedule);
    }
}
