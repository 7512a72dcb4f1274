//! `ostinato-schedule` — calendar patterns with a timezone-aware
//! next-occurrence calculator.
//!
//! # Overview
//!
//! A [`Schedule`] is a set of optional calendar constraints evaluated on
//! the local clock of a fixed [`ScheduleTimeZone`].
//! [`Schedule::next_occurrence`] returns the earliest instant strictly
//! after a reference instant that satisfies every constrained field,
//! checked on a one-minute grid.
//!
//! | Field          | Range | Notes                                  |
//! |----------------|-------|----------------------------------------|
//! | `minute`       | 0–59  |                                        |
//! | `hour`         | 0–23  |                                        |
//! | `day_of_week`  | 1–7   | ISO: 1 = Monday … 7 = Sunday           |
//! | `day_of_month` | 1–31  | mutually exclusive with `day_of_week`  |
//! | `month`        | 1–12  | month 2 + day 29 skips common years    |

pub mod error;
pub mod schedule;
pub mod timezone;

pub use error::{Result, ScheduleError};
pub use schedule::{Schedule, ScheduleSpec};
pub use timezone::ScheduleTimeZone;
