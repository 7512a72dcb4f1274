use async_trait::async_trait;

use crate::error::JobError;

/// Application-supplied unit of work driven by a recurring job.
///
/// Implementations must be `Send + Sync`. The engine runs `run` on its own
/// task, so a panicking handler is contained and treated as a failed run.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Stable identifier for this job, used in log messages and as the
    /// registration key in the [`JobManager`](crate::JobManager).
    fn name(&self) -> &str;

    /// One execution. Errors are logged and never stop the recurring loop.
    async fn run(&self) -> anyhow::Result<()>;
}

/// Lifecycle capability shared by both job shapes.
#[async_trait]
pub trait Job: Send + Sync {
    /// The handler's name.
    fn name(&self) -> &str;

    /// True once `start()` has succeeded. Monotonic.
    fn is_started(&self) -> bool;

    /// True once `dispose()` has been called. Monotonic.
    fn is_disposed(&self) -> bool;

    /// Begin the self-rescheduling timer loop.
    ///
    /// Must be called from within a Tokio runtime. Errors when the job is
    /// already started or disposed.
    fn start(&self) -> Result<(), JobError>;

    /// Stop scheduling future work. Idempotent.
    ///
    /// Cancels a pending timer; an execution already in flight runs to
    /// completion, only its re-arm is suppressed.
    async fn dispose(&self);
}
