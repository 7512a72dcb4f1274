use thiserror::Error;

/// Errors raised by schedule setters and the next-occurrence calculator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// A setter received a value outside its documented range.
    #[error("{field} out of range: {value} (allowed {min}..={max})")]
    FieldOutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// `day_of_week` cannot be constrained while `day_of_month` is set.
    #[error("Cannot set day_of_week when day_of_month is set")]
    DayOfWeekConflict,

    /// `day_of_month` cannot be constrained while `day_of_week` is set.
    #[error("Cannot set day_of_month when day_of_week is set")]
    DayOfMonthConflict,

    /// The month/day combination denotes a day that exists in no year.
    /// Feb 29 is exempt because leap years recur.
    #[error("Month {month} does not have {day} days")]
    ImpossibleDayOfMonth { month: u32, day: u32 },
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
