use thiserror::Error;

use ostinato_schedule::ScheduleError;

/// Lifecycle and configuration errors raised by the job shapes.
#[derive(Debug, Error)]
pub enum JobError {
    /// `start()` was called while the job was already running.
    #[error("Job already started: {name}")]
    AlreadyStarted { name: String },

    /// `start()` was called after `dispose()`.
    #[error("Job disposed: {name}")]
    Disposed { name: String },

    /// A timed job's interval exceeds the cap.
    #[error(
        "Interval out of range: {} ms (allowed 0..={} ms)",
        .actual.as_millis(),
        .max.as_millis()
    )]
    IntervalOutOfRange {
        actual: std::time::Duration,
        max: std::time::Duration,
    },

    /// The job's schedule can never produce an occurrence.
    #[error("Invalid schedule: {0}")]
    Schedule(#[from] ScheduleError),
}

/// Call-order and registration errors raised by the manager.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// A job with this name is already registered.
    #[error("Duplicate job registration: {name}")]
    DuplicateJob { name: String },

    /// `bootstrap()` was called twice, or `register_job()` after it.
    #[error("Manager already bootstrapped")]
    AlreadyBootstrapped,

    /// `start_jobs()` requires a prior `bootstrap()`.
    #[error("Manager not bootstrapped")]
    NotBootstrapped,

    /// `bootstrap()` with zero registered jobs.
    #[error("No jobs registered")]
    NoJobs,

    /// The manager was already disposed.
    #[error("Manager disposed")]
    Disposed,

    /// A job failed to start.
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// The container rejected an operation.
    #[error("Container error: {0}")]
    Container(#[from] anyhow::Error),
}
