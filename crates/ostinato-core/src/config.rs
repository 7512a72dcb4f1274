use std::time::Duration;

// Engine timing constants — shared by both job shapes.

/// Hard cap on a timed job's fixed interval.
pub const MAX_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60); // 12 h

/// A computed calendar delay above this arms a recheck instead of the work
/// timer, so a single timer is never set extremely far out.
pub const LONG_DELAY_THRESHOLD: Duration = Duration::from_secs(20 * 24 * 60 * 60); // 20 days

/// How far out the silent recheck timer is armed.
pub const RECHECK_DELAY: Duration = Duration::from_secs(15 * 24 * 60 * 60); // 15 days
