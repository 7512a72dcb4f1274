use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of zones a [`Schedule`](crate::Schedule) can be evaluated in.
///
/// Calendar fields are interpreted on the local clock of this zone and the
/// computed occurrence converts back to UTC. Arbitrary IANA names are
/// deliberately not exposed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleTimeZone {
    /// Coordinated Universal Time.
    Utc,
    /// The host system's local zone.
    #[default]
    Local,
    /// America/New_York.
    Eastern,
    /// America/Los_Angeles.
    Pacific,
}

impl ScheduleTimeZone {
    /// Project a UTC instant onto this zone's local calendar.
    pub(crate) fn to_local(self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            ScheduleTimeZone::Utc => instant.naive_utc(),
            ScheduleTimeZone::Local => instant.with_timezone(&chrono::Local).naive_local(),
            ScheduleTimeZone::Eastern => instant
                .with_timezone(&chrono_tz::America::New_York)
                .naive_local(),
            ScheduleTimeZone::Pacific => instant
                .with_timezone(&chrono_tz::America::Los_Angeles)
                .naive_local(),
        }
    }

    /// Map a local calendar time back to a UTC instant.
    ///
    /// DST fall-back overlaps resolve to the earliest mapping; spring-forward
    /// gaps return `None` (the local minute does not exist).
    pub(crate) fn from_local(self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            ScheduleTimeZone::Utc => Some(Utc.from_utc_datetime(&local)),
            ScheduleTimeZone::Local => resolve(chrono::Local.from_local_datetime(&local)),
            ScheduleTimeZone::Eastern => {
                resolve(chrono_tz::America::New_York.from_local_datetime(&local))
            }
            ScheduleTimeZone::Pacific => {
                resolve(chrono_tz::America::Los_Angeles.from_local_datetime(&local))
            }
        }
    }
}

fn resolve<T: TimeZone>(mapped: LocalResult<DateTime<T>>) -> Option<DateTime<Utc>> {
    match mapped {
        LocalResult::Single(instant) => Some(instant.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}
